//! Collatz step counting
//!
//! The leaf of the crate: a pure function from a positive integer to the
//! number of `n/2` / `3n+1` iterations needed to reach 1.
//!
//! Termination for arbitrary input is the Collatz conjecture and has no known
//! proof. Every input anyone has tried terminates, so the function is treated
//! as total. [`StepCounter`] exists for callers that want a hard bound anyway.

use crate::types::{Error, Result};

/// Count Collatz iterations from `n` down to 1.
///
/// `steps(1) == 0`. Intermediate values are carried as `u128`, so trajectories
/// that climb far above `n` are never truncated. Zero is outside the domain
/// and yields 0.
pub fn steps(n: u64) -> u64 {
    let mut value = n as u128;
    let mut count = 0u64;
    while value > 1 {
        value = if value % 2 == 0 { value / 2 } else { 3 * value + 1 };
        count += 1;
    }
    count
}

/// Checked step counter with an optional iteration bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCounter {
    max_iterations: Option<u64>,
}

impl StepCounter {
    /// Counter with no iteration bound
    pub const fn unbounded() -> Self {
        Self { max_iterations: None }
    }

    /// Counter that fails once a trajectory needs more than `max_iterations` steps
    pub const fn with_limit(max_iterations: u64) -> Self {
        Self { max_iterations: Some(max_iterations) }
    }

    /// Build from an optional bound, as read from configuration
    pub const fn from_limit(max_iterations: Option<u64>) -> Self {
        Self { max_iterations }
    }

    /// The configured bound, if any
    pub fn max_iterations(&self) -> Option<u64> {
        self.max_iterations
    }

    /// Count steps for `n`, enforcing the domain and the bound.
    ///
    /// Fails with [`Error::InvalidArgument`] for `n == 0` and with
    /// [`Error::ComputationDivergent`] when the bound is exceeded or the
    /// trajectory overflows `u128`.
    pub fn count(&self, n: u64) -> Result<u64> {
        if n == 0 {
            return Err(Error::invalid_argument("step count input must be positive"));
        }

        let limit = self.max_iterations.unwrap_or(u64::MAX);
        let mut value = n as u128;
        let mut count = 0u64;
        while value != 1 {
            if count >= limit {
                return Err(Error::ComputationDivergent { number: n, limit });
            }
            value = if value % 2 == 0 {
                value / 2
            } else {
                value
                    .checked_mul(3)
                    .and_then(|v| v.checked_add(1))
                    .ok_or_else(|| Error::ComputationDivergent { number: n, limit })?
            };
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(steps(1), 0);
        assert_eq!(steps(2), 1);
        assert_eq!(steps(6), 8);
        assert_eq!(steps(7), 16);
        assert_eq!(steps(27), 111);
        // https://en.wikipedia.org/wiki/Collatz_conjecture#Empirical_data
        assert_eq!(steps(837_799), 524);
    }

    #[test]
    fn test_trajectory_above_u64() {
        // 3n+1 on the largest odd u64 does not fit in u64
        let n = u64::MAX;
        assert!(steps(n) > 0);
        assert_eq!(StepCounter::unbounded().count(n).unwrap(), steps(n));
    }

    #[test]
    fn test_zero_input() {
        assert_eq!(steps(0), 0);
        let err = StepCounter::unbounded().count(0).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_counter_matches_pure_function() {
        let counter = StepCounter::default();
        for n in 1..=2_000u64 {
            assert_eq!(counter.count(n).unwrap(), steps(n), "mismatch at {}", n);
        }
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert_eq!(StepCounter::with_limit(111).count(27).unwrap(), 111);
        match StepCounter::with_limit(110).count(27) {
            Err(Error::ComputationDivergent { number, limit }) => {
                assert_eq!(number, 27);
                assert_eq!(limit, 110);
            }
            other => panic!("expected divergence, got {:?}", other),
        }
    }

    #[test]
    fn test_limit_zero_only_accepts_one() {
        let counter = StepCounter::with_limit(0);
        assert_eq!(counter.count(1).unwrap(), 0);
        assert!(counter.count(2).is_err());
    }
}
