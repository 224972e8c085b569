//! Blocking counterpart of the polling driver, for code without an async runtime.
use std::thread::sleep;

use crate::error::PolicyError;
use crate::policy::IntervalPolicy;

/// Iterate over the indices `1..=max_runs` of `policy`, sleeping on the current thread
/// before every index after the first.
///
/// The sequence is driven by the same recurrence as [`PollingDriver`](crate::PollingDriver):
/// `policy.next(0)` fixes `max_runs`, then `policy.next(i)` gives the delay before `i`.
/// Stopping early is a matter of no longer calling `next`.
///
/// # Examples
///
/// ```
/// use pollen::sync::ticks;
/// use pollen::Linear;
///
/// let mut attempts = 0;
/// for tick in ticks(Linear::from_millis(5, 1)) {
///     let iteration = tick.expect("linear policies never fail");
///     attempts += 1;
///     if iteration == 3 {
///         break;
///     }
/// }
/// assert_eq!(attempts, 3);
/// ```
pub fn ticks<P: IntervalPolicy>(policy: P) -> Ticks<P> {
    Ticks {
        policy,
        max_runs: None,
        iteration: 0,
        done: false,
    }
}

/// Iterator returned by [`ticks`].
///
/// Yields `Ok(i)` per iteration; a policy failure is yielded once and ends the iterator.
#[derive(Debug, Clone)]
pub struct Ticks<P> {
    policy: P,
    max_runs: Option<u32>,
    iteration: u32,
    done: bool,
}

impl<P: IntervalPolicy> Ticks<P> {
    fn advance(&mut self) -> Result<Option<u32>, PolicyError> {
        let max_runs = match self.max_runs {
            Some(max_runs) => max_runs,
            None => *self.max_runs.insert(self.policy.next(0)?.max_runs()),
        };
        if self.iteration >= max_runs {
            return Ok(None);
        }

        let iteration = self.iteration + 1;
        let effective = self.policy.next(iteration)?;
        if iteration > 1 {
            sleep(effective.duration_between_runs());
        }

        self.iteration = iteration;
        Ok(Some(iteration))
    }
}

impl<P: IntervalPolicy> Iterator for Ticks<P> {
    type Item = Result<u32, PolicyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.advance() {
            Ok(Some(iteration)) => Some(Ok(iteration)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
