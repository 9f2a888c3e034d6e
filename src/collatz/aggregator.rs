//! Parallel Aggregator
//!
//! Fans the inputs `1..=N` out over a [`WorkerPool`] of `W` workers, counts
//! steps for each input outside any lock, and merges every result into a
//! [`SharedAggregate`] that belongs to this call alone.

use crate::collatz::aggregate::{Aggregate, SharedAggregate};
use crate::collatz::pool::{WorkerPool, DEFAULT_QUEUE_CAPACITY};
use crate::collatz::steps::StepCounter;
use crate::system::metrics::{Metrics, Timer};
use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one run over `1..=numbers` with `workers` threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Upper bound of the input range
    pub numbers: u64,
    /// Worker count used
    pub workers: usize,
    /// `total_steps / processed_count`
    pub mean_steps: f64,
    /// Largest step count in the range
    pub max_steps: u64,
    /// Input that produced `max_steps`. When several inputs share the maximum,
    /// this is whichever was merged first, which varies between runs with
    /// more than one worker.
    pub max_number: u64,
    /// Sum of all step counts
    pub total_steps: u64,
    /// Inputs merged; always equals `numbers` on success
    pub processed_count: u64,
    /// Wall-clock duration of the run
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunSummary {
    fn from_aggregate(numbers: u64, workers: usize, aggregate: Aggregate, elapsed: Duration) -> Self {
        Self {
            numbers,
            workers,
            mean_steps: aggregate.mean_steps(),
            max_steps: aggregate.max_steps,
            max_number: aggregate.max_number,
            total_steps: aggregate.total_steps,
            processed_count: aggregate.processed_count,
            elapsed,
        }
    }

    /// The `(mean_steps, max_steps, max_number)` triple
    pub fn triple(&self) -> (f64, u64, u64) {
        (self.mean_steps, self.max_steps, self.max_number)
    }
}

/// Configured aggregator; cheap to copy and safe to run concurrently.
#[derive(Debug, Clone, Copy)]
pub struct ParallelAggregator {
    counter: StepCounter,
    queue_capacity: usize,
}

impl Default for ParallelAggregator {
    fn default() -> Self {
        Self::new(StepCounter::unbounded())
    }
}

impl ParallelAggregator {
    /// Aggregator using `counter` for every input
    pub fn new(counter: StepCounter) -> Self {
        Self {
            counter,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Override the work queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Process `1..=numbers` with `workers` threads.
    ///
    /// Fails with [`Error::InvalidArgument`] before doing any work when either
    /// argument is zero. A [`Error::ComputationDivergent`] from any input fails
    /// the whole run and no aggregate is returned.
    pub fn run(&self, numbers: u64, workers: usize) -> Result<RunSummary> {
        if numbers == 0 {
            return Err(Error::invalid_argument(format!(
                "numbers must be positive, got {}",
                numbers
            )));
        }
        if workers == 0 {
            return Err(Error::invalid_argument(format!(
                "worker count must be positive, got {}",
                workers
            )));
        }

        let metrics = Metrics::global();
        let timer = Timer::start(metrics.run_duration.clone());
        info!(numbers, workers, "Running Collatz aggregation");

        let aggregate = SharedAggregate::new();
        let counter = self.counter;
        let pool = WorkerPool::new(workers)?.with_queue_capacity(self.queue_capacity);

        let outcome = pool.execute(1..=numbers, |number| {
            let steps = counter.count(number)?;
            aggregate.merge(number, steps);
            Ok(())
        });

        let stats = match outcome {
            Ok(stats) => stats,
            Err(err) => {
                metrics.runs_failed.inc();
                warn!(numbers, workers, error = %err, "Run aborted");
                return Err(err);
            }
        };
        debug!(per_worker = ?stats.per_worker, "Per-worker item counts");

        let elapsed = Duration::from_secs_f64(timer.finish());
        let summary = RunSummary::from_aggregate(numbers, workers, aggregate.into_inner(), elapsed);

        metrics.runs.inc();
        metrics.items_processed.inc_by(summary.processed_count);

        info!(
            workers,
            mean_steps = summary.mean_steps,
            max_steps = summary.max_steps,
            max_number = summary.max_number,
            elapsed_ms = elapsed.as_millis() as u64,
            "Run complete"
        );
        Ok(summary)
    }
}

/// Process `1..=numbers` with `workers` threads and no iteration bound.
pub fn run(numbers: u64, workers: usize) -> Result<RunSummary> {
    ParallelAggregator::default().run(numbers, workers)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
