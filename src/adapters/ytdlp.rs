//! yt-dlp MediaResolver implementation.

use crate::domain::stream::VideoId;
use crate::ports::resolver::{MediaResolver, ResolveError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Resolves a video id with `yt-dlp -g`.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: PathBuf,
    cookies: Option<PathBuf>,
    format: String,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cookies: None,
            format: String::from("b"),
        }
    }

    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    fn command(&self, video_id: &VideoId) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(cookies) = &self.cookies {
            command.arg("--cookies").arg(cookies);
        }
        command
            .arg("-f")
            .arg(&self.format)
            .arg("-g")
            .arg(format!("{}{}", WATCH_URL, video_id))
            .stdin(Stdio::null());
        command
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, video_id: &VideoId) -> Result<String, ResolveError> {
        debug!(video_id = %video_id, "resolving media url");
        let output = self
            .command(video_id)
            .output()
            .await
            .map_err(ResolveError::Spawn)?;

        if !output.status.success() {
            return Err(ResolveError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or(ResolveError::EmptyOutput)
    }
}
