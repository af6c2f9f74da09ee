use crate::domain::stream::{StreamRecord, VideoId};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to open stream database {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("stream database query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("stream database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamRepository: Send + Sync {
    /// Persist a record for `video_id`, doing nothing if one already exists.
    async fn insert(&self, video_id: &VideoId) -> Result<(), RepositoryError>;

    /// Delete the record for `video_id`.
    /// Returns whether a record was actually removed.
    async fn remove(&self, video_id: &VideoId) -> Result<bool, RepositoryError>;

    /// All records with a valid video id, in insertion order
    async fn list(&self) -> Result<Vec<StreamRecord>, RepositoryError>;
}
