//! Ports - Traits the application layer depends on.

pub mod repository;
pub mod resolver;
pub mod transcoder;
