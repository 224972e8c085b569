//! Interval policies: how many iterations a run has and how long to wait before each.
use std::time::Duration;

use crate::error::PolicyError;

/// Constant delay between runs.
pub mod linear;
pub use linear::Linear;

/// Delay doubling with every iteration, unbounded.
pub mod exponential;
pub use exponential::Exponential;

/// Delay doubling with every iteration, clamped to a ceiling.
pub mod capped;
pub use capped::ExponentialCapped;

#[cfg(feature = "random")]
mod jitter;
#[cfg(feature = "random")]
pub use jitter::Jittered;

/// A value describing a polling run, plus the recurrence deriving the policy for a given
/// iteration.
///
/// Implementations must be pure: `next` never mutates the receiver and returns the same
/// value every time it is called with the same index.
pub trait IntervalPolicy: Clone + Send + Sync + 'static {
    /// Total number of iterations to emit.
    fn max_runs(&self) -> u32;

    /// Delay associated with this instance.
    fn duration_between_runs(&self) -> Duration;

    /// Derives the policy in effect at `iteration`.
    fn next(&self, iteration: u32) -> Result<Self, PolicyError>;
}

/// Runtime-selectable policy over the bundled variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Constant delay, see [`Linear`].
    Linear(Linear),
    /// Unbounded doubling, see [`Exponential`].
    Exponential(Exponential),
    /// Doubling clamped to a ceiling, see [`ExponentialCapped`].
    ExponentialCapped(ExponentialCapped),
}

impl IntervalPolicy for Policy {
    fn max_runs(&self) -> u32 {
        match self {
            Policy::Linear(p) => p.max_runs(),
            Policy::Exponential(p) => p.max_runs(),
            Policy::ExponentialCapped(p) => p.max_runs(),
        }
    }

    fn duration_between_runs(&self) -> Duration {
        match self {
            Policy::Linear(p) => p.duration_between_runs(),
            Policy::Exponential(p) => p.duration_between_runs(),
            Policy::ExponentialCapped(p) => p.duration_between_runs(),
        }
    }

    fn next(&self, iteration: u32) -> Result<Self, PolicyError> {
        Ok(match self {
            Policy::Linear(p) => Policy::Linear(p.next(iteration)?),
            Policy::Exponential(p) => Policy::Exponential(p.next(iteration)?),
            Policy::ExponentialCapped(p) => Policy::ExponentialCapped(p.next(iteration)?),
        })
    }
}

impl From<Linear> for Policy {
    fn from(policy: Linear) -> Self {
        Policy::Linear(policy)
    }
}

impl From<Exponential> for Policy {
    fn from(policy: Exponential) -> Self {
        Policy::Exponential(policy)
    }
}

impl From<ExponentialCapped> for Policy {
    fn from(policy: ExponentialCapped) -> Self {
        Policy::ExponentialCapped(policy)
    }
}

/// Computes `base * 2^exponent`, or `None` when the result is not representable.
pub(crate) fn scale_pow2(base: Duration, exponent: u32) -> Option<Duration> {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    if base.is_zero() {
        return Some(Duration::ZERO);
    }

    let nanos = base.as_nanos();
    if exponent > nanos.leading_zeros() {
        return None;
    }

    let scaled = nanos << exponent;
    let secs = u64::try_from(scaled / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (scaled % NANOS_PER_SEC) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_pow2_doubles() {
        let base = Duration::from_millis(100);
        assert_eq!(scale_pow2(base, 0), Some(base));
        assert_eq!(scale_pow2(base, 3), Some(Duration::from_millis(800)));
        assert_eq!(
            scale_pow2(Duration::new(1, 500_000_000), 1),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn scale_pow2_zero_base_never_overflows() {
        assert_eq!(scale_pow2(Duration::ZERO, u32::MAX), Some(Duration::ZERO));
    }

    #[test]
    fn scale_pow2_overflow() {
        assert_eq!(scale_pow2(Duration::from_nanos(1), 127), None);
        assert_eq!(scale_pow2(Duration::from_secs(1), 200), None);
        assert_eq!(scale_pow2(Duration::MAX, 1), None);
    }

    #[test]
    fn enum_delegates_to_variant() {
        let policy = Policy::from(ExponentialCapped::from_millis(3, 100, 250));
        let next = policy.next(2).unwrap();
        assert_eq!(next.max_runs(), 3);
        assert_eq!(next.duration_between_runs(), Duration::from_millis(250));
        assert!(matches!(next, Policy::ExponentialCapped(_)));
    }
}
