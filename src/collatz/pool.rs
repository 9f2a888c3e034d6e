//! Fixed-size worker pool
//!
//! The calling thread produces inputs into a bounded `flume` channel and `W`
//! long-lived workers consume it until the channel disconnects. Workers are
//! spawned in a `crossbeam` scope, so they may borrow from the caller and are
//! all joined before [`WorkerPool::execute`] returns.

use crate::types::{Error, Result};
use crossbeam::thread;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Default capacity of the work queue between producer and workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Per-execution statistics reported by the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of workers that took part
    pub workers: usize,
    /// Items consumed by each worker, indexed by worker id
    pub per_worker: Vec<u64>,
}

impl PoolStats {
    /// Items consumed across all workers
    pub fn total(&self) -> u64 {
        self.per_worker.iter().sum()
    }
}

/// A pool of `workers` threads living for one `execute` call.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    queue_capacity: usize,
}

impl WorkerPool {
    /// Create a pool description with `workers` threads.
    ///
    /// Fails with [`Error::InvalidArgument`] when `workers == 0`.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::invalid_argument("worker count must be positive"));
        }
        Ok(Self {
            workers,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        })
    }

    /// Override the work queue capacity (clamped to at least 1)
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` once for every input and wait for all workers to finish.
    ///
    /// Every input is received by exactly one worker. Inputs are handed out
    /// in order but may complete in any order. After the first job error the
    /// workers keep draining the queue without running the job, and that
    /// error is returned once everything is joined.
    pub fn execute<I, F>(&self, inputs: I, job: F) -> Result<PoolStats>
    where
        I: IntoIterator<Item = u64>,
        F: Fn(u64) -> Result<()> + Sync,
    {
        let (tx, rx) = flume::bounded::<u64>(self.queue_capacity);
        let first_error: Mutex<Option<Error>> = Mutex::new(None);
        let failed = AtomicBool::new(false);

        debug!(
            workers = self.workers,
            queue_capacity = self.queue_capacity,
            "Starting worker pool"
        );

        let job = &job;
        let first_error_ref = &first_error;
        let failed_ref = &failed;

        let outcome = thread::scope(|scope| -> Result<Vec<u64>> {
            let mut handles = Vec::with_capacity(self.workers);
            for worker_id in 0..self.workers {
                let rx = rx.clone();
                let spawned = scope
                    .builder()
                    .name(format!("collatz-worker-{}", worker_id))
                    .spawn(move |_| {
                        let mut consumed = 0u64;
                        for number in rx.iter() {
                            consumed += 1;
                            if failed_ref.load(Ordering::Acquire) {
                                continue;
                            }
                            if let Err(err) = job(number) {
                                let mut slot = first_error_ref.lock();
                                if slot.is_none() {
                                    *slot = Some(err);
                                }
                                failed_ref.store(true, Ordering::Release);
                            }
                        }
                        trace!(worker_id, consumed, "Worker drained queue");
                        consumed
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // Disconnect so the workers already running can exit
                        drop(tx);
                        return Err(e.into());
                    }
                }
            }
            drop(rx);

            for number in inputs {
                if tx.send(number).is_err() {
                    // Every worker is gone; the joins below report why
                    break;
                }
            }
            drop(tx);

            let mut per_worker = Vec::with_capacity(handles.len());
            let mut panicked = None;
            for handle in handles {
                match handle.join() {
                    Ok(consumed) => per_worker.push(consumed),
                    Err(payload) => {
                        per_worker.push(0);
                        panicked.get_or_insert_with(|| panic_message(payload.as_ref()));
                    }
                }
            }
            match panicked {
                Some(msg) => Err(Error::WorkerPanicked(msg)),
                None => Ok(per_worker),
            }
        });

        let per_worker = match outcome {
            Ok(result) => result?,
            Err(payload) => return Err(Error::WorkerPanicked(panic_message(payload.as_ref()))),
        };

        if let Some(err) = first_error.into_inner() {
            return Err(err);
        }

        let stats = PoolStats {
            workers: self.workers,
            per_worker,
        };
        debug!(items = stats.total(), "Worker pool finished");
        Ok(stats)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
