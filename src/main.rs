//! Restream binary
//!
//! Wires up:
//! - SQLite stream registry
//! - yt-dlp resolver and ffmpeg HLS transcoder
//! - Job event logging
//! - HTTP management page and static HLS output

use restream::adapters::events::{self, hub::EventHub};
use restream::adapters::ffmpeg::FfmpegTranscoder;
use restream::adapters::http;
use restream::adapters::sqlite::SqliteStreamRepository;
use restream::adapters::ytdlp::YtDlpResolver;
use restream::{AppConfig, StreamLayout, StreamManager};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt::init();

    // 1. Adapters
    let repo = SqliteStreamRepository::new(&config.database_path);
    if let Err(e) = repo.initialize().await {
        error!(error = %e, "failed to initialize stream database");
        std::process::exit(1);
    }
    match repo.purge_invalid().await {
        Ok(0) => {}
        Ok(purged) => warn!(purged, "removed stream records with invalid video ids"),
        Err(e) => error!(error = %e, "failed to purge invalid stream records"),
    }

    let resolver = YtDlpResolver::new(&config.ytdlp_path)
        .with_cookies(config.ytdlp_cookies.clone())
        .with_format(&config.ytdlp_format);
    let transcoder = FfmpegTranscoder::new(&config.ffmpeg_path, config.hls_window);

    if let Err(e) = tokio::fs::create_dir_all(&config.streams_dir).await {
        error!(path = %config.streams_dir.display(), error = %e, "failed to create streams directory");
        std::process::exit(1);
    }

    // 2. Job events
    let event_hub = Arc::new(EventHub::new());
    events::listener::start(event_hub.clone());

    // 3. Stream lifecycle manager
    let manager = Arc::new(StreamManager::new(
        repo,
        resolver,
        transcoder,
        StreamLayout::new(&config.streams_dir),
        event_hub,
    ));

    if config.resume_streams {
        manager.resume_persisted().await;
    }

    // 4. HTTP layer
    let app = http::router(manager);

    let listener = match tokio::net::TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %config.bind_address(), error = %e, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    info!("Listening at {}", config.bind_address());
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
