//! Shared type definitions

pub mod error;

pub use error::{Error, Result};
