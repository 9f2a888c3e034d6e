//! End-to-end checks of `run` across worker counts

use collatz_pool::{run, steps, Error, ParallelAggregator, StepCounter};
use proptest::prelude::*;
use std::thread;

fn sequential_total(n: u64) -> u64 {
    (1..=n).map(steps).sum()
}

#[test]
fn test_sweep_matches_sequential() {
    const N: u64 = 20_000;
    let expected_total = sequential_total(N);
    let expected_max = (1..=N).map(steps).max().unwrap();

    let baseline = run(N, 1).unwrap();
    for workers in [1, 2, 4, 8, 16] {
        let summary = run(N, workers).unwrap();
        assert_eq!(summary.processed_count, N, "workers={}", workers);
        assert_eq!(summary.total_steps, expected_total, "workers={}", workers);
        assert_eq!(summary.max_steps, expected_max);
        assert_eq!(summary.mean_steps, baseline.mean_steps);
        assert_eq!(steps(summary.max_number), summary.max_steps);
    }
}

#[test]
fn test_single_worker_ties_resolve_to_smallest_input() {
    // With one worker inputs merge in order, so the first maximum wins
    let (mean, max_steps, max_number) = run(100_000, 1).unwrap().triple();
    assert_eq!(max_steps, 350);
    assert_eq!(max_number, 77_031);
    assert_eq!(mean, sequential_total(100_000) as f64 / 100_000.0);
}

#[test]
fn test_invalid_arguments() {
    let err = run(0, 4).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    let err = run(100, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_concurrent_runs_are_isolated() {
    let handles: Vec<_> = [500u64, 1_000, 1_500, 2_000]
        .into_iter()
        .map(|n| thread::spawn(move || (n, run(n, 4).unwrap())))
        .collect();

    for handle in handles {
        let (n, summary) = handle.join().unwrap();
        assert_eq!(summary.processed_count, n);
        assert_eq!(summary.total_steps, sequential_total(n));
    }
}

#[test]
fn test_bounded_counter_aborts_run() {
    let aggregator = ParallelAggregator::new(StepCounter::with_limit(50)).with_queue_capacity(4);
    match aggregator.run(1_000, 8) {
        Err(Error::ComputationDivergent { limit, number }) => {
            assert_eq!(limit, 50);
            assert!(steps(number) > 50);
        }
        other => panic!("expected divergence, got {:?}", other),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_aggregate_independent_of_workers(n in 1u64..3_000, w1 in 1usize..12, w2 in 1usize..12) {
        let a = run(n, w1).unwrap();
        let b = run(n, w2).unwrap();

        prop_assert_eq!(a.processed_count, n);
        prop_assert_eq!(b.processed_count, n);
        prop_assert_eq!(a.total_steps, sequential_total(n));
        prop_assert_eq!(a.total_steps, b.total_steps);
        prop_assert_eq!(a.mean_steps, b.mean_steps);
        prop_assert_eq!(a.max_steps, b.max_steps);
        prop_assert_eq!(steps(a.max_number), a.max_steps);
        prop_assert_eq!(steps(b.max_number), b.max_steps);
    }
}
