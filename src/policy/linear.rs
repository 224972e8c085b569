use std::time::Duration;

use crate::error::PolicyError;
use crate::policy::IntervalPolicy;

/// Every iteration after the first waits the same delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linear {
    max_runs: u32,
    duration: Duration,
}

impl Linear {
    /// Create a new [`Linear`] running `max_runs` times, `duration` apart.
    pub fn new(max_runs: u32, duration: Duration) -> Self {
        Linear { max_runs, duration }
    }

    /// Create a new [`Linear`] using the given duration in milliseconds.
    pub fn from_millis(max_runs: u32, millis: u64) -> Self {
        Self::new(max_runs, Duration::from_millis(millis))
    }
}

impl IntervalPolicy for Linear {
    fn max_runs(&self) -> u32 {
        self.max_runs
    }

    fn duration_between_runs(&self) -> Duration {
        self.duration
    }

    fn next(&self, _iteration: u32) -> Result<Self, PolicyError> {
        Ok(*self)
    }
}

#[test]
fn linear_is_constant() {
    let policy = Linear::from_millis(10, 100);
    for iteration in [0, 1, 2, 50, u32::MAX] {
        let next = policy.next(iteration).unwrap();
        assert_eq!(next, policy);
        assert_eq!(next.duration_between_runs(), Duration::from_millis(100));
    }
}
