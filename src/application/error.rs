use crate::domain::stream::InvalidVideoId;
use crate::ports::repository::RepositoryError;
use crate::ports::resolver::ResolveError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid video id: {0}")]
    InvalidVideoId(#[from] InvalidVideoId),
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
    #[error("filesystem error at {path}: {source}")]
    Filesystem { path: PathBuf, source: io::Error },
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolveError),
}
