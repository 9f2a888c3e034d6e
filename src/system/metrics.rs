//! Metrics collection for collatz-pool
//!
//! Prometheus counters and a run-duration histogram, registered once in a
//! crate-owned registry and updated by the aggregator after every run.

use crate::types::Result;
use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::time::Instant;

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Run-level metrics
pub struct Metrics {
    /// Runs that completed with a full aggregate
    pub runs: IntCounter,
    /// Runs that failed after validation (divergence, worker panic)
    pub runs_failed: IntCounter,
    /// Inputs merged across all successful runs
    pub items_processed: IntCounter,
    /// Wall-clock duration of successful runs in seconds
    pub run_duration: Histogram,
}

impl Metrics {
    /// Create and register a new metrics instance
    fn new(registry: &Registry) -> Result<Self> {
        let runs = IntCounter::new("collatz_runs_total", "Total number of completed runs")?;
        let runs_failed = IntCounter::new(
            "collatz_runs_failed_total",
            "Total number of runs aborted by a worker error",
        )?;
        let items_processed = IntCounter::new(
            "collatz_items_processed_total",
            "Total number of inputs merged into an aggregate",
        )?;
        let run_duration = Histogram::with_opts(
            HistogramOpts::new("collatz_run_duration_seconds", "Duration of runs in seconds")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(runs_failed.clone()))?;
        registry.register(Box::new(items_processed.clone()))?;
        registry.register(Box::new(run_duration.clone()))?;

        Ok(Self {
            runs,
            runs_failed,
            items_processed,
            run_duration,
        })
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> = Lazy::new(|| {
            Metrics::new(registry()).expect("Failed to initialize metrics")
        });
        &INSTANCE
    }
}

/// Timer for measuring operation duration with automatic histogram recording
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) -> f64 {
        let secs = self.start.elapsed().as_secs_f64();
        self.histogram.observe(secs);
        secs
    }
}

/// Initialize the metrics registry by creating the global metrics instance
pub fn init_registry() {
    let _ = Metrics::global();
}

/// Get the Prometheus registry holding every collatz-pool metric
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics as a Prometheus-formatted string
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registered_once() {
        init_registry();
        init_registry();
        let text = collect_metrics();
        assert!(text.contains("collatz_runs_total"));
        assert!(text.contains("collatz_items_processed_total"));
        assert!(text.contains("collatz_run_duration_seconds"));
    }

    #[test]
    fn test_timer_records_observation() {
        let histogram = Histogram::with_opts(HistogramOpts::new("test_timer_seconds", "timer")).unwrap();
        let timer = Timer::start(histogram.clone());
        let secs = timer.finish();
        assert!(secs >= 0.0);
        assert_eq!(histogram.get_sample_count(), 1);
    }
}
