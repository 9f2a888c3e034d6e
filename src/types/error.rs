//! Error types and handling for collatz-pool
//!
//! A run either returns a fully consistent aggregate or one of these errors;
//! there is no partial-success shape.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for collatz-pool
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument is out of range (zero numbers, zero workers).
    /// Raised before any work is dispatched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single step count exceeded the configured iteration bound, or its
    /// trajectory overflowed. Aborts the whole run.
    #[error("Computation diverged at {number}: more than {limit} iterations")]
    ComputationDivergent {
        /// Input whose trajectory did not reach 1 in time
        number: u64,
        /// Iteration bound that was exceeded (`u64::MAX` for overflow)
        limit: u64,
    },

    /// A worker thread panicked while processing the batch
    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization of run summaries
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller could succeed by correcting its inputs
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
