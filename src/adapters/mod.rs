//! Adapters - Concrete implementations of ports.

pub mod events;
pub mod ffmpeg;
pub mod http;
pub mod sqlite;
pub mod ytdlp;
