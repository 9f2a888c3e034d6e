//! collatz-pool - Parallel Collatz step-count aggregation
//!
//! Computes the Collatz step count of every integer in `1..=N` on a pool of
//! `W` worker threads and folds the results into one aggregate per run:
//! total steps, inputs processed, and the input with the most steps.
//!
//! ```no_run
//! let summary = collatz_pool::run(100_000, 8)?;
//! println!("{:.2} {} {}", summary.mean_steps, summary.max_number, summary.max_steps);
//! # Ok::<(), collatz_pool::Error>(())
//! ```
#![warn(missing_docs)]

// Configure global allocator for maximum performance
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

// Step counting, worker pool and aggregation
pub mod collatz;

// Driver configuration and logging
pub mod core;

// Metrics
pub mod system;

// Errors
pub mod types;

// Re-export commonly used items for convenience
pub use crate::collatz::{run, steps, ParallelAggregator, RunSummary, StepCounter};
pub use crate::core::Config;
pub use crate::types::{Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
