use crate::domain::stream::VideoId;
use async_trait::async_trait;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to run resolver: {0}")]
    Spawn(#[source] io::Error),
    #[error("resolver exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("resolver returned an empty media url")]
    EmptyOutput,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Turn a video id into a direct, playable media url.
    async fn resolve(&self, video_id: &VideoId) -> Result<String, ResolveError>;
}
