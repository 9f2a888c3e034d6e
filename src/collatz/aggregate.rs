//! Aggregate state shared by the workers of one run
//!
//! [`SharedAggregate`] is the only shared mutable resource in a run. All four
//! fields live behind one mutex and change together in [`SharedAggregate::merge`],
//! so no worker can observe `max_steps` without its matching `max_number`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Summary of every merged `(number, steps)` pair so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Sum of step counts of merged inputs
    pub total_steps: u64,
    /// Number of merged inputs
    pub processed_count: u64,
    /// Largest step count seen
    pub max_steps: u64,
    /// Input that first reached `max_steps` in merge order
    pub max_number: u64,
}

impl Aggregate {
    /// Fold one result into the summary.
    ///
    /// Strictly greater step counts replace the maximum, so on ties the
    /// earlier merge wins. With several workers the merge order is whatever
    /// the scheduler produced, which makes `max_number` non-deterministic
    /// across runs whenever the maximum is shared.
    pub fn merge(&mut self, number: u64, steps: u64) {
        self.total_steps += steps;
        self.processed_count += 1;
        if steps > self.max_steps {
            self.max_steps = steps;
            self.max_number = number;
        }
    }

    /// Arithmetic mean of merged step counts, 0 when nothing was merged
    pub fn mean_steps(&self) -> f64 {
        if self.processed_count > 0 {
            self.total_steps as f64 / self.processed_count as f64
        } else {
            0.0
        }
    }
}

/// Mutex-protected [`Aggregate`] owned by a single run.
#[derive(Debug, Default)]
pub struct SharedAggregate {
    inner: Mutex<Aggregate>,
}

impl SharedAggregate {
    /// Zeroed aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one result inside a single critical section
    #[inline]
    pub fn merge(&self, number: u64, steps: u64) {
        self.inner.lock().merge(number, steps);
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Aggregate {
        *self.inner.lock()
    }

    /// Consume and return the final state
    pub fn into_inner(self) -> Aggregate {
        self.inner.into_inner()
    }
}
