//! Restream - Live HLS restreaming of online videos
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (stream ids and paths, hls, job events)
//! - ports/: Trait definitions (repository, resolver, transcoder)
//! - adapters/: Concrete implementations (sqlite, yt-dlp, ffmpeg, http, events)
//! - application/: Stream lifecycle manager and job supervision
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::error::StreamError;
pub use application::manager::StreamManager;
pub use config::AppConfig;
pub use domain::stream::{StreamInfo, StreamLayout, StreamRecord, StreamStatus, VideoId};
