//! # Pollen
//!
//! A lazy, cancellable polling scheduler driven by pluggable interval policies.
//!
//! `pollen` turns an [`IntervalPolicy`] into a sequence of iteration indices `1..=max_runs`.
//! The first index fires immediately; every later one waits for the delay the policy computes
//! for that iteration. Callers do their own work per index and stop whenever they like.
//!
//! ## Features
//!
//! - Asynchronous polling through [`PollingDriver`] and its [`PollStream`]
//! - Blocking polling through the `sync` module
//! - Bundled policies: [`Linear`], [`Exponential`] and [`ExponentialCapped`]
//! - Cooperative cancellation with [`PollingDriver::cancel`], or by dropping the stream
//!
//! ## Usage Examples
//!
//! ### Asynchronous Usage
//!
//! ```rust
//! use pollen::{ExponentialCapped, PollingDriver};
//!
//! # async fn job_is_done(_: u32) -> bool { true }
//! async fn wait_for_job() -> Result<bool, pollen::PollError> {
//!     let driver = PollingDriver::new(ExponentialCapped::from_millis(8, 50, 2_000));
//!     let mut ticks = driver.start()?;
//!
//!     while let Some(iteration) = ticks.recv().await {
//!         if job_is_done(iteration?).await {
//!             driver.cancel();
//!             return Ok(true);
//!         }
//!     }
//!     Ok(false)
//! }
//! ```
//!
//! ### Synchronous Usage
//!
//! ```rust
//! use pollen::sync::ticks;
//! use pollen::Linear;
//!
//! for tick in ticks(Linear::from_millis(3, 1)) {
//!     let iteration = tick.unwrap();
//!     println!("attempt {iteration}");
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `random`: Enables the [`Jittered`](policy::Jittered) policy decorator (depends on rand)
pub mod config;
pub mod driver;
pub mod error;
pub mod policy;
pub mod sync;

pub use config::{Buffer, DriverConfig};
pub use driver::{PollStream, PollingDriver, RunState};
pub use error::{PollError, PolicyError};
pub use policy::{Exponential, ExponentialCapped, IntervalPolicy, Linear, Policy};
#[cfg(feature = "random")]
pub use policy::Jittered;
