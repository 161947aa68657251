//! # Host primitives consumed by the cooperative backend.
//!
//! A host is whatever drives the single control flow: a tokio runtime, a browser-like
//! event loop, or a hardware tick. The cooperative backend needs exactly three
//! things from it:
//!
//! ```text
//! run_now(job)            "run this at the next opportunity"
//! run_after(delay, job)   "run this after D, give me a handle"
//! clear(handle)           "never mind"
//! ```
//!
//! ## Contract
//! - Jobs run one at a time from the host's point of view; the host never
//!   interrupts a running job.
//! - `run_after` fails fast instead of silently never firing.
//! - `clear` on a fired or already cleared handle is a no-op.

use std::time::Duration;

use crate::core::{Job, PlatformKind};
use crate::error::RuntimeError;

/// Delayed-callback capability of a host environment.
pub trait Host: Send + Sync + 'static {
    /// Native timer handle, opaque to the context.
    type Timer: Send + 'static;

    /// Execution model this host represents.
    fn platform(&self) -> PlatformKind {
        PlatformKind::CooperativeHost
    }

    /// Runs `job` at the next opportunity of the host flow.
    fn run_now(&self, job: Job);

    /// Runs `job` after `delay`.
    ///
    /// # Errors
    /// [`RuntimeError::InvalidDelay`] or [`RuntimeError::TimerExhausted`].
    fn run_after(&self, delay: Duration, job: Job) -> Result<Self::Timer, RuntimeError>;

    /// Releases a timer so its job never runs.
    fn clear(&self, timer: Self::Timer);
}
