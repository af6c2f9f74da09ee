use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Prefix prepended to a video id to build its stream name.
pub const STREAM_PREFIX: &str = "stream_";
/// Playlist file written by the transcoder inside each stream directory.
pub const PLAYLIST_FILE: &str = "stream.m3u8";

const MAX_VIDEO_ID_LEN: usize = 64;

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid video id pattern"))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidVideoId {
    #[error("video id is empty")]
    Empty,
    #[error("video id is longer than 64 characters")]
    TooLong,
    #[error("video id {0:?} contains characters outside [A-Za-z0-9_-]")]
    Charset(String),
}

/// User supplied identifier of a video.
///
/// The id ends up in a process argument, a URL, a directory name and an HTML
/// page, so only `[A-Za-z0-9_-]{1,64}` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(raw: &str) -> Result<Self, InvalidVideoId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InvalidVideoId::Empty);
        }
        if raw.len() > MAX_VIDEO_ID_LEN {
            return Err(InvalidVideoId::TooLong);
        }
        if !video_id_pattern().is_match(raw) {
            return Err(InvalidVideoId::Charset(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn stream_name(&self) -> String {
        format!("{}{}", STREAM_PREFIX, self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = InvalidVideoId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(value: VideoId) -> Self {
        value.0
    }
}

/// Persisted row of the `streams` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRecord {
    pub id: i64,
    pub video_id: VideoId,
}

/// Where the output of a stream lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPaths {
    pub stream_name: String,
    pub output_dir: PathBuf,
    pub playlist_path: PathBuf,
}

/// Maps video ids to directories under a single streams root.
#[derive(Debug, Clone)]
pub struct StreamLayout {
    root: PathBuf,
}

impl StreamLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self, video_id: &VideoId) -> StreamPaths {
        let stream_name = video_id.stream_name();
        let output_dir = self.root.join(&stream_name);
        let playlist_path = output_dir.join(PLAYLIST_FILE);
        StreamPaths {
            stream_name,
            output_dir,
            playlist_path,
        }
    }
}

/// Outcome of a successful `start`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub video_id: VideoId,
    pub stream_name: String,
    pub output_dir: PathBuf,
    pub playlist_path: PathBuf,
    /// False when a running job was kept or the transcoder failed to spawn.
    pub launched: bool,
}

impl StreamInfo {
    pub fn new(video_id: VideoId, paths: StreamPaths, launched: bool) -> Self {
        Self {
            video_id,
            stream_name: paths.stream_name,
            output_dir: paths.output_dir,
            playlist_path: paths.playlist_path,
            launched,
        }
    }
}

/// A persisted stream joined with what is currently happening on this host.
#[derive(Debug, Clone, Serialize)]
pub struct StreamStatus {
    pub video_id: VideoId,
    pub stream_name: String,
    pub playlist_path: PathBuf,
    pub running: bool,
    /// Segments currently listed in the live playlist.
    pub segments: usize,
}

impl StreamStatus {
    pub fn playlist_url_path(&self) -> String {
        format!("/streams/{}/{}", self.stream_name, PLAYLIST_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_youtube_ids() {
        for raw in ["abc123", "dQw4w9WgXcQ", "a-b_c", "  padded  "] {
            assert!(VideoId::parse(raw).is_ok(), "{raw} should be accepted");
        }
        assert_eq!(VideoId::parse("  padded ").unwrap().as_str(), "padded");
    }

    #[test]
    fn test_rejects_empty_id() {
        assert_eq!(VideoId::parse(""), Err(InvalidVideoId::Empty));
        assert_eq!(VideoId::parse("   "), Err(InvalidVideoId::Empty));
    }

    #[test]
    fn test_rejects_unsafe_ids() {
        for raw in ["../etc", "a b", "$(rm -rf ~)", "x\"y", "a/b", "id;ls", "<script>"] {
            assert!(
                matches!(VideoId::parse(raw), Err(InvalidVideoId::Charset(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_overlong_id() {
        let raw = "a".repeat(MAX_VIDEO_ID_LEN + 1);
        assert_eq!(VideoId::parse(&raw), Err(InvalidVideoId::TooLong));
        assert!(VideoId::parse(&"a".repeat(MAX_VIDEO_ID_LEN)).is_ok());
    }

    #[test]
    fn test_layout_paths() {
        let layout = StreamLayout::new("streams");
        let paths = layout.paths(&VideoId::parse("abc123").unwrap());

        assert_eq!(paths.stream_name, "stream_abc123");
        assert_eq!(paths.output_dir, PathBuf::from("streams/stream_abc123"));
        assert_eq!(
            paths.playlist_path,
            PathBuf::from("streams/stream_abc123/stream.m3u8")
        );
    }

    #[test]
    fn test_video_id_serde() {
        let id: VideoId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert!(serde_json::from_str::<VideoId>("\"../x\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }
}
