//! Error types surfaced by interval policies and the polling driver.
use std::time::Duration;

use thiserror::Error;

use crate::driver::RunState;

/// Errors raised while computing the policy for an iteration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The computed delay does not fit in a [`Duration`].
    #[error("delay overflow at iteration {iteration}: {base:?} * 2^{iteration} is not representable")]
    Overflow {
        /// Iteration the delay was computed for.
        iteration: u32,
        /// Base delay the growth started from.
        base: Duration,
    },

    /// A custom policy rejected the iteration.
    #[error("invalid policy at iteration {iteration}: {reason}")]
    Invalid {
        /// Iteration the policy was computed for.
        iteration: u32,
        /// Human-readable reason.
        reason: String,
    },
}

impl PolicyError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PolicyError::Overflow { .. } => "policy_overflow",
            PolicyError::Invalid { .. } => "policy_invalid",
        }
    }

    /// Iteration the failure belongs to.
    pub fn iteration(&self) -> u32 {
        match self {
            PolicyError::Overflow { iteration, .. } | PolicyError::Invalid { iteration, .. } => {
                *iteration
            }
        }
    }
}

/// Errors produced by [`PollingDriver`](crate::PollingDriver) and its stream.
///
/// Cancellation is not an error: a cancelled run simply ends its stream.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The policy failed mid-run; delivered as the last item of the stream.
    #[error("policy computation failed: {0}")]
    Policy(#[from] PolicyError),

    /// The polling task panicked; delivered as the last item of the stream.
    #[error("polling task panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },

    /// `start()` was called on a driver that already left the idle state.
    #[error("driver cannot start from the {state} state")]
    NotIdle {
        /// State the driver was in.
        state: RunState,
    },

    /// `start()` was called outside of a tokio runtime.
    #[error("no tokio runtime available to spawn the polling task")]
    NoRuntime,
}

impl PollError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pollen::{PollError, RunState};
    ///
    /// let err = PollError::NotIdle { state: RunState::Running };
    /// assert_eq!(err.as_label(), "driver_not_idle");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PollError::Policy(inner) => inner.as_label(),
            PollError::Panicked { .. } => "driver_panicked",
            PollError::NotIdle { .. } => "driver_not_idle",
            PollError::NoRuntime => "driver_no_runtime",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_error_converts_into_poll_error() {
        let err: PollError = PolicyError::Invalid {
            iteration: 4,
            reason: "nope".into(),
        }
        .into();
        assert_eq!(err.as_label(), "policy_invalid");
        assert_eq!(
            err.to_string(),
            "policy computation failed: invalid policy at iteration 4: nope"
        );
    }

    #[test]
    fn not_idle_message_names_the_state() {
        let err = PollError::NotIdle {
            state: RunState::Cancelled,
        };
        assert_eq!(err.to_string(), "driver cannot start from the cancelled state");
    }

    #[test]
    fn panicked_carries_the_payload() {
        let err = PollError::Panicked {
            message: "kaboom".into(),
        };
        assert_eq!(err.as_label(), "driver_panicked");
        assert_eq!(err.to_string(), "polling task panicked: kaboom");
    }

    #[test]
    fn iteration_is_reported_for_every_variant() {
        let overflow = PolicyError::Overflow {
            iteration: 90,
            base: Duration::from_secs(1),
        };
        assert_eq!(overflow.iteration(), 90);
        assert_eq!(overflow.as_label(), "policy_overflow");
    }
}
