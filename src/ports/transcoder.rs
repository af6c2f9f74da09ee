use async_trait::async_trait;
use std::io;
use std::path::Path;

/// How a transcoder process ended on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
    /// Last lines the process wrote to stderr, if any.
    pub stderr: Option<String>,
}

/// A running transcoder process.
#[async_trait]
pub trait TranscodeProcess: Send {
    fn id(&self) -> Option<u32>;

    async fn wait(&mut self) -> io::Result<ProcessExit>;

    async fn kill(&mut self) -> io::Result<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait Transcoder: Send + Sync {
    /// Start repackaging `source_url` into a rolling HLS playlist at `playlist_path`.
    /// Returns as soon as the process is spawned.
    fn launch(
        &self,
        source_url: &str,
        playlist_path: &Path,
    ) -> io::Result<Box<dyn TranscodeProcess>>;
}
