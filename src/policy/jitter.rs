use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PolicyError;
use crate::policy::IntervalPolicy;

/// Spreads the delay of any policy over `[delay / 2, delay]`.
///
/// The random draw is seeded from `(seed, iteration)`, so the same iteration always
/// gets the same delay and the wrapped policy stays deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jittered<P> {
    template: P,
    effective: P,
    seed: u64,
    current: Duration,
}

impl<P: IntervalPolicy> Jittered<P> {
    /// Wrap `inner`, drawing jitter from `seed`.
    pub fn new(inner: P, seed: u64) -> Self {
        let current = inner.duration_between_runs();
        Jittered {
            effective: inner.clone(),
            template: inner,
            seed,
            current,
        }
    }

    /// Wrap `inner` with a seed taken from the thread-local generator.
    pub fn with_random_seed(inner: P) -> Self {
        Self::new(inner, rand::random())
    }

    /// The wrapped policy as it stands at this iteration, before jitter.
    pub fn inner(&self) -> &P {
        &self.effective
    }
}

impl<P: IntervalPolicy> IntervalPolicy for Jittered<P> {
    fn max_runs(&self) -> u32 {
        self.effective.max_runs()
    }

    fn duration_between_runs(&self) -> Duration {
        self.current
    }

    fn next(&self, iteration: u32) -> Result<Self, PolicyError> {
        let effective = self.template.next(iteration)?;
        let current = equal_jitter(effective.duration_between_runs(), self.seed, iteration);

        Ok(Jittered {
            template: self.template.clone(),
            effective,
            seed: self.seed,
            current,
        })
    }
}

fn equal_jitter(delay: Duration, seed: u64, iteration: u32) -> Duration {
    let Ok(nanos) = u64::try_from(delay.as_nanos()) else {
        return delay;
    };
    if nanos == 0 {
        return delay;
    }

    let mixed = seed ^ u64::from(iteration).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = StdRng::seed_from_u64(mixed);
    Duration::from_nanos(rng.random_range(nanos / 2..=nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Exponential, Linear};

    #[test]
    fn jitter_stays_within_half_and_full_delay() {
        let policy = Jittered::new(Exponential::from_millis(20, 100), 7);
        for iteration in 1..20 {
            let raw = policy.inner().next(iteration).unwrap().duration_between_runs();
            let jittered = policy.next(iteration).unwrap().duration_between_runs();
            assert!(jittered >= raw / 2 && jittered <= raw, "{jittered:?} vs {raw:?}");
        }
    }

    #[test]
    fn jitter_is_deterministic_per_iteration() {
        let policy = Jittered::new(Linear::from_millis(5, 1_000), 42);
        let first = policy.next(3).unwrap();
        let again = policy.next(3).unwrap().next(3).unwrap();
        assert_eq!(first.duration_between_runs(), again.duration_between_runs());
        assert_eq!(first.max_runs(), 5);
    }

    #[test]
    fn jitter_keeps_zero_delay() {
        let policy = Jittered::with_random_seed(Linear::new(2, Duration::ZERO));
        assert_eq!(policy.next(2).unwrap().duration_between_runs(), Duration::ZERO);
    }

    #[test]
    fn jitter_propagates_inner_failure() {
        let policy = Jittered::new(Exponential::from_millis(100, 1_000), 1);
        assert!(matches!(policy.next(64), Err(PolicyError::Overflow { .. })));
    }
}
