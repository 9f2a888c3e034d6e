//! Collatz step counting and its parallel aggregation
//!
//! [`steps`] is the pure per-input function. [`ParallelAggregator`] spreads
//! `1..=N` over a [`WorkerPool`] and folds every result into a per-run
//! [`SharedAggregate`].

pub mod aggregate;
pub mod aggregator;
pub mod pool;
pub mod steps;

pub use aggregate::{Aggregate, SharedAggregate};
pub use aggregator::{run, ParallelAggregator, RunSummary};
pub use pool::{PoolStats, WorkerPool};
pub use steps::{steps, StepCounter};
