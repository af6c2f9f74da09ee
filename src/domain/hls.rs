use std::path::Path;
use tokio::fs;

/// Rolling window the transcoder keeps on disk for a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HlsWindow {
    /// Target duration of each segment, in seconds.
    pub segment_seconds: u32,
    /// Number of segments kept in the playlist.
    pub list_size: u32,
    /// Delete segments that fall out of the playlist.
    pub delete_segments: bool,
}

impl Default for HlsWindow {
    fn default() -> Self {
        Self {
            segment_seconds: 20,
            list_size: 20,
            delete_segments: true,
        }
    }
}

impl HlsWindow {
    /// ffmpeg muxer options producing this window.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            self.segment_seconds.to_string(),
            "-hls_list_size".to_string(),
            self.list_size.to_string(),
        ];
        if self.delete_segments {
            args.push("-hls_flags".to_string());
            args.push("delete_segments".to_string());
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaSegment {
    pub duration: f64,
    pub uri: String,
}

/// The parts of a live media playlist we care about when reporting status.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaPlaylist {
    pub version: u8,
    pub target_duration: u64,
    pub media_sequence: u64,
    pub segments: Vec<MediaSegment>,
    pub end_list: bool,
}

impl MediaPlaylist {
    /// Parse an m3u8 media playlist. Unknown tags are skipped.
    pub fn parse(content: &str) -> Self {
        let mut playlist = MediaPlaylist::default();
        let mut pending_duration: Option<f64> = None;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(value) = line.strip_prefix("#EXT-X-VERSION:") {
                playlist.version = value.parse().unwrap_or_default();
            } else if let Some(value) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
                playlist.target_duration = value.parse().unwrap_or_default();
            } else if let Some(value) = line.strip_prefix("#EXT-X-MEDIA-SEQUENCE:") {
                playlist.media_sequence = value.parse().unwrap_or_default();
            } else if let Some(value) = line.strip_prefix("#EXTINF:") {
                let duration = value.split(',').next().unwrap_or_default();
                pending_duration = duration.parse().ok();
            } else if line == "#EXT-X-ENDLIST" {
                playlist.end_list = true;
            } else if !line.starts_with('#') {
                if let Some(duration) = pending_duration.take() {
                    playlist.segments.push(MediaSegment {
                        duration,
                        uri: line.to_string(),
                    });
                }
            }
        }

        playlist
    }

    /// Read the playlist at `path`, `None` if the transcoder has not written it yet.
    pub async fn read_from(path: &Path) -> Result<Option<Self>, std::io::Error> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(Self::parse(&content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
