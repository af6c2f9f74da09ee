//! Configuration loaded from the environment.

use crate::domain::hls::HlsWindow;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// SQLite database holding the registered streams
    pub database_path: PathBuf,
    /// Root directory of the HLS output, served under `/streams`
    pub streams_dir: PathBuf,
    pub ytdlp_path: PathBuf,
    /// Cookies file passed to yt-dlp, if any
    pub ytdlp_cookies: Option<PathBuf>,
    pub ytdlp_format: String,
    pub ffmpeg_path: PathBuf,
    pub hls_window: HlsWindow,
    /// Relaunch every persisted stream at startup
    pub resume_streams: bool,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| String::from(default))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_current_env()
    }

    fn from_current_env() -> Self {
        let defaults = HlsWindow::default();
        let cookies = var_or("YTDLP_COOKIES", "cookies.txt");

        Self {
            addr: var_or("ADDR", "127.0.0.1"),
            port: var_or("PORT", "3000"),
            database_path: PathBuf::from(var_or("DATABASE_PATH", "./streams.db")),
            streams_dir: PathBuf::from(var_or("STREAMS_DIR", "./streams")),
            ytdlp_path: PathBuf::from(var_or("YTDLP_PATH", "yt-dlp")),
            ytdlp_cookies: (!cookies.trim().is_empty()).then(|| PathBuf::from(cookies)),
            ytdlp_format: var_or("YTDLP_FORMAT", "b"),
            ffmpeg_path: PathBuf::from(var_or("FFMPEG_PATH", "ffmpeg")),
            hls_window: HlsWindow {
                segment_seconds: parse_or("HLS_TIME", defaults.segment_seconds),
                list_size: parse_or("HLS_LIST_SIZE", defaults.list_size),
                delete_segments: defaults.delete_segments,
            },
            resume_streams: parse_or("RESUME_STREAMS", false),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}
