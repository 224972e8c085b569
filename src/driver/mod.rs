//! Asynchronous polling driver: turns an [`IntervalPolicy`] into a timed stream of iteration
//! indices.
//!
//! Every call to [`PollingDriver::start`] spawns one tokio task that walks iterations
//! `1..=max_runs`. The first iteration is emitted immediately; every later one waits for the
//! delay of the policy computed for that iteration.
//!
//! ## Termination
//!
//! - All iterations emitted: the stream ends, state [`RunState::Completed`].
//! - The policy fails or panics: the error is the last stream item, state
//!   [`RunState::Failed`].
//! - [`PollingDriver::cancel`] or dropping the [`PollStream`]: the task stops at its next
//!   suspension point, the stream ends without an error, state [`RunState::Cancelled`].
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, debug_span, field, trace, warn};

use crate::config::DriverConfig;
use crate::error::{PollError, PolicyError};
use crate::policy::IntervalPolicy;

mod stream;
pub use stream::PollStream;
use stream::Sender;

/// Lifecycle of a [`PollingDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Constructed, not started.
    #[default]
    Idle,
    /// The polling task is emitting.
    Running,
    /// Every iteration was emitted.
    Completed,
    /// Stopped by [`PollingDriver::cancel`] or by dropping the stream.
    Cancelled,
    /// The policy failed, or the polling task panicked.
    Failed,
}

impl RunState {
    /// Returns `true` for states a driver never leaves.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: RunState,
    token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl Shared {
    /// The first terminal state wins.
    fn settle(&mut self, outcome: RunState) {
        if self.state == RunState::Running {
            self.state = outcome;
        }
    }
}

/// Drives one polling run for a fixed policy.
///
/// A driver starts at most once. Clones share the same run, so a clone can be handed to
/// whatever code needs to [`cancel`](PollingDriver::cancel) it.
///
/// # Examples
///
/// ```
/// use pollen::{Linear, PollingDriver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), pollen::PollError> {
/// let driver = PollingDriver::new(Linear::from_millis(3, 10));
/// let mut ticks = driver.start()?;
///
/// let mut seen = Vec::new();
/// while let Some(iteration) = ticks.recv().await {
///     seen.push(iteration?);
/// }
///
/// assert_eq!(seen, [1, 2, 3]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PollingDriver<P> {
    policy: P,
    config: DriverConfig,
    shared: Arc<Mutex<Shared>>,
}

impl<P: IntervalPolicy> PollingDriver<P> {
    /// Create an idle driver with the default configuration.
    pub fn new(policy: P) -> Self {
        Self::with_config(policy, DriverConfig::default())
    }

    /// Create an idle driver with an explicit configuration.
    pub fn with_config(policy: P, config: DriverConfig) -> Self {
        PollingDriver {
            policy,
            config,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// The policy template this driver was built with.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.shared.lock().state
    }

    /// Returns `true` once the driver reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Spawns the polling task and returns the stream of iteration indices.
    ///
    /// # Errors
    ///
    /// - [`PollError::NotIdle`] if the driver was already started or cancelled.
    /// - [`PollError::NoRuntime`] when called outside of a tokio runtime.
    pub fn start(&self) -> Result<PollStream, PollError> {
        let mut shared = self.shared.lock();
        if shared.state != RunState::Idle {
            return Err(PollError::NotIdle {
                state: shared.state,
            });
        }
        let runtime = Handle::try_current().map_err(|_| PollError::NoRuntime)?;

        let token = CancellationToken::new();
        let (tx, stream) = stream::channel(self.config.buffer, token.clone());
        let span = debug_span!(
            "poll",
            name = self.config.name.as_deref().unwrap_or_default(),
            max_runs = field::Empty
        );

        shared.state = RunState::Running;
        shared.token = Some(token.clone());
        shared.task = Some(runtime.spawn(
            run(self.policy.clone(), tx, token, Arc::clone(&self.shared)).instrument(span),
        ));

        Ok(stream)
    }

    /// Stops the run. Idempotent; a no-op once the driver is finished.
    ///
    /// An idle driver becomes [`RunState::Cancelled`] and can no longer be started.
    pub fn cancel(&self) {
        let mut shared = self.shared.lock();
        match shared.state {
            RunState::Idle => {
                shared.state = RunState::Cancelled;
                debug!("idle driver cancelled");
            }
            RunState::Running => {
                if let Some(token) = &shared.token {
                    token.cancel();
                }
                shared.state = RunState::Cancelled;
                debug!("polling cancelled");
            }
            RunState::Completed | RunState::Cancelled | RunState::Failed => {}
        }
    }

    /// Waits for the polling task to exit. Returns immediately if none is running.
    pub async fn join(&self) {
        let task = self.shared.lock().task.take();
        let Some(task) = task else {
            return;
        };

        if let Err(err) = task.await {
            warn!(error = %err, "polling task ended abnormally");
            self.shared.lock().settle(RunState::Failed);
        }
    }
}

async fn run<P: IntervalPolicy>(
    policy: P,
    tx: Sender,
    token: CancellationToken,
    shared: Arc<Mutex<Shared>>,
) {
    let produced = AssertUnwindSafe(produce(&policy, &tx, &token))
        .catch_unwind()
        .await;

    let outcome = match produced {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            warn!(
                iteration = err.iteration(),
                label = err.as_label(),
                error = %err,
                "policy computation failed"
            );
            deliver_failure(&tx, &token, err.into()).await
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "polling task panicked");
            deliver_failure(&tx, &token, PollError::Panicked { message }).await
        }
    };

    // Settle before the sender drops so a consumer that sees the end also sees the state.
    shared.lock().settle(outcome);
    drop(tx);
    debug!(outcome = %outcome, "polling finished");
}

/// Sends `err` as the final item unless the run is cancelled first.
async fn deliver_failure(tx: &Sender, token: &CancellationToken, err: PollError) -> RunState {
    tokio::select! {
        biased;
        _ = token.cancelled() => RunState::Cancelled,
        _ = tx.send(Err(err)) => RunState::Failed,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

async fn produce<P: IntervalPolicy>(
    policy: &P,
    tx: &Sender,
    token: &CancellationToken,
) -> Result<RunState, PolicyError> {
    let max_runs = policy.next(0)?.max_runs();
    Span::current().record("max_runs", max_runs);
    debug!(max_runs, "polling started");

    for iteration in 1..=max_runs {
        let effective = policy.next(iteration)?;

        if iteration > 1 {
            let delay = effective.duration_between_runs();
            trace!(iteration, ?delay, "waiting before emission");
            tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(RunState::Cancelled),
                _ = time::sleep(delay) => {}
            }
        }

        let delivered = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(RunState::Cancelled),
            delivered = tx.send(Ok(iteration)) => delivered,
        };
        if !delivered {
            debug!(iteration, "stream dropped before emission");
            return Ok(RunState::Cancelled);
        }
        trace!(iteration, "emitted");
    }

    Ok(RunState::Completed)
}
