//! Application layer - Services built on the ports.

pub mod error;
pub mod manager;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod test_support;
