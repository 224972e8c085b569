use std::time::Duration;

use crate::error::PolicyError;
use crate::policy::{IntervalPolicy, scale_pow2};

/// Each iteration waits `base * 2^iteration`.
///
/// The delay is always recomputed from the base given at construction, so calling
/// [`IntervalPolicy::next`] twice with the same index yields the same value. Growth is
/// unbounded: an iteration whose delay no longer fits in a [`Duration`] fails with
/// [`PolicyError::Overflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exponential {
    max_runs: u32,
    base: Duration,
    current: Duration,
}

impl Exponential {
    /// Create a new [`Exponential`] using `base` as the initial delay.
    pub fn new(max_runs: u32, base: Duration) -> Self {
        Exponential {
            max_runs,
            base,
            current: base,
        }
    }

    /// Create a new [`Exponential`] using the given millisecond duration as the base delay.
    pub fn from_millis(max_runs: u32, base: u64) -> Self {
        Self::new(max_runs, Duration::from_millis(base))
    }

    /// The construction-time base delay.
    pub fn base(&self) -> Duration {
        self.base
    }
}

impl IntervalPolicy for Exponential {
    fn max_runs(&self) -> u32 {
        self.max_runs
    }

    fn duration_between_runs(&self) -> Duration {
        self.current
    }

    fn next(&self, iteration: u32) -> Result<Self, PolicyError> {
        let current = scale_pow2(self.base, iteration).ok_or(PolicyError::Overflow {
            iteration,
            base: self.base,
        })?;

        Ok(Exponential { current, ..*self })
    }
}

#[test]
fn exponential_doubles_from_base() {
    let policy = Exponential::from_millis(4, 100);
    let delays: Vec<_> = (1..=4)
        .map(|i| policy.next(i).unwrap().duration_between_runs())
        .collect();
    assert_eq!(
        delays,
        [200, 400, 800, 1600].map(Duration::from_millis).to_vec()
    );
}

#[test]
fn exponential_does_not_accumulate() {
    let policy = Exponential::from_millis(4, 100);
    let once = policy.next(3).unwrap();
    let twice = once.next(3).unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice.duration_between_runs(), Duration::from_millis(800));
    assert_eq!(twice.max_runs(), 4);
}

#[test]
fn exponential_overflow() {
    let policy = Exponential::from_millis(100, 1_000);
    assert_eq!(
        policy.next(64),
        Err(PolicyError::Overflow {
            iteration: 64,
            base: Duration::from_secs(1),
        })
    );
}

#[test]
fn exponential_zero_base_runs_immediately() {
    let policy = Exponential::new(5, Duration::ZERO);
    assert_eq!(policy.next(500).unwrap().duration_between_runs(), Duration::ZERO);
}
