//! Configuration and logging for the driver

pub mod config;
pub mod logging;

// Re-export commonly used items
pub use config::{Config, ThreadCount};
