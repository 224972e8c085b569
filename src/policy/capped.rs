use std::time::Duration;

use crate::error::PolicyError;
use crate::policy::{IntervalPolicy, scale_pow2};

/// Same growth law as [`Exponential`](crate::policy::Exponential), clamped to `max_interval`.
///
/// A product too large for a [`Duration`] is clamped as well, so this policy never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialCapped {
    max_runs: u32,
    base: Duration,
    current: Duration,
    max_interval: Duration,
}

impl ExponentialCapped {
    /// Create a new [`ExponentialCapped`] growing from `base` up to `max_interval`.
    pub fn new(max_runs: u32, base: Duration, max_interval: Duration) -> Self {
        ExponentialCapped {
            max_runs,
            base,
            current: base.min(max_interval),
            max_interval,
        }
    }

    /// Create a new [`ExponentialCapped`] from millisecond durations.
    pub fn from_millis(max_runs: u32, base: u64, max_interval: u64) -> Self {
        Self::new(
            max_runs,
            Duration::from_millis(base),
            Duration::from_millis(max_interval),
        )
    }

    /// The ceiling every computed delay is clamped to.
    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }
}

impl IntervalPolicy for ExponentialCapped {
    fn max_runs(&self) -> u32 {
        self.max_runs
    }

    fn duration_between_runs(&self) -> Duration {
        self.current
    }

    fn next(&self, iteration: u32) -> Result<Self, PolicyError> {
        let current = scale_pow2(self.base, iteration)
            .map_or(self.max_interval, |delay| delay.min(self.max_interval));

        Ok(ExponentialCapped { current, ..*self })
    }
}

#[test]
fn capped_clamps_growth() {
    let policy = ExponentialCapped::from_millis(10, 100, 1_000);
    let delays: Vec<_> = (1..=6)
        .map(|i| policy.next(i).unwrap().duration_between_runs().as_millis())
        .collect();
    assert_eq!(delays, vec![200, 400, 800, 1_000, 1_000, 1_000]);
}

#[test]
fn capped_first_step_hits_ceiling() {
    let policy = ExponentialCapped::new(2, Duration::from_secs(1), Duration::from_secs(2));
    let next = policy.next(1).unwrap();
    assert_eq!(next.duration_between_runs(), Duration::from_secs(2));
    assert_eq!(next.max_interval(), Duration::from_secs(2));
}

#[test]
fn capped_overflow_saturates_to_ceiling() {
    let policy = ExponentialCapped::from_millis(3, 1_000, 30_000);
    assert_eq!(
        policy.next(u32::MAX).unwrap().duration_between_runs(),
        Duration::from_secs(30)
    );
}
