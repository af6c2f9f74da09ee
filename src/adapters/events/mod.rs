//! Job event fan-out.

pub mod hub;
pub mod listener;
