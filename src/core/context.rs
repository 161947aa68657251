//! # The platform context contract.
//!
//! [`PlatformContext`] is the capability set every scheduling backend implements,
//! whether the host offers real worker threads or a single cooperative event loop.
//!
//! ```text
//!                  ┌──────────────────────────── PlatformContext ───────────────────────────┐
//!  descriptors:    │ platform()  load()  pause()  is_active()  is_terminated()  bus()       │
//!  admission:      │ execute(job)        schedule(job, delay) ──► CancelRef                  │
//!  polling:        │ await_ready(probe) ──► Awaitable (built from schedule + cancel)         │
//!  lifecycle:      │ shutdown(force)     wait_for_exit(force, interval, request)             │
//!                  └───────────────┬───────────────────────────────────┬─────────────────────┘
//!                                  ▼                                   ▼
//!                      CooperativeContext<H: Host>              ThreadedContext
//!                      (one flow, host timers)           (tokio workers, task tracker)
//! ```
//!
//! ## Rules
//! - Admission is a one-way latch: after `shutdown` nothing new is admitted and
//!   `is_active()` never returns `true` again.
//! - Work submitted to a closed context is dropped silently (no error, no branch
//!   needed at the call site).
//! - `is_terminated()` is a capability query: cooperative hosts always answer `false`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::awaitable::Awaitable;
use crate::core::cancel::CancelRef;
use crate::error::{RuntimeError, TaskError};
use crate::events::Bus;

/// A unit of fire-and-forget work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A non-blocking readiness probe evaluated on the scheduler's own tick.
///
/// Returns `true` once it has produced (and delivered) its result. It must return
/// promptly and must not panic.
pub type Probe = Box<dyn FnMut() -> bool + Send + 'static>;

/// Polled by `wait_for_exit`; returns `true` once the program wants to stop.
pub type ShutdownRequest = Box<dyn FnMut() -> bool + Send + 'static>;

/// Shared handle to any backend.
pub type ContextRef = Arc<dyn PlatformContext>;

/// Execution model a context implements. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    /// Genuine concurrent worker threads.
    ThreadedHost,
    /// A single logical control flow driven by an event loop.
    CooperativeHost,
    /// A single control flow driven by an external tick (timer interrupt, manual driver).
    EmbeddedHost,
}

impl PlatformKind {
    /// True if submitted work may run in parallel with the submitter.
    pub fn is_threaded(self) -> bool {
        matches!(self, PlatformKind::ThreadedHost)
    }
}

/// Scheduling backend contract.
#[async_trait]
pub trait PlatformContext: Send + Sync + 'static {
    /// Execution model of this context.
    fn platform(&self) -> PlatformKind;

    /// Advisory concurrency factor.
    fn load(&self) -> usize;

    /// Natural polling interval used by [`await_ready`](Self::await_ready).
    fn pause(&self) -> Duration;

    /// `false` once shutdown was requested; never flips back.
    fn is_active(&self) -> bool;

    /// `true` once shutdown was requested and every admitted task finished.
    fn is_terminated(&self) -> bool;

    /// Event bus the context publishes to.
    fn bus(&self) -> &Bus;

    /// Runs `job` at the next opportunity. No-op after shutdown.
    fn execute(&self, job: Job);

    /// Hands the failure of work that has no result channel to the failure hook.
    fn report_failure(&self, err: &TaskError);

    /// Runs `job` no earlier than `delay` from now.
    ///
    /// Cancelling the returned token before the delay elapses guarantees the job
    /// never runs. After shutdown an already-inert token is returned.
    ///
    /// # Errors
    /// Fails fast when the host cannot arm the timer.
    fn schedule(&self, job: Job, delay: Duration) -> Result<CancelRef, RuntimeError>;

    /// Evaluates `probe` every [`pause`](Self::pause) until it reports ready.
    ///
    /// The returned token stops polling when cancelled.
    ///
    /// # Errors
    /// Fails fast when the first probe cannot be scheduled.
    fn await_ready(self: Arc<Self>, probe: Probe) -> Result<CancelRef, RuntimeError> {
        let pause = self.pause();
        let awaitable: CancelRef = Awaitable::start(self, pause, probe)?;
        Ok(awaitable)
    }

    /// Closes admission. `force` additionally drops pending work where the
    /// backend is able to.
    fn shutdown(&self, force: bool);

    /// Final action of the controlling flow.
    ///
    /// Polls `request` once per `interval`; on the first positive answer calls
    /// [`shutdown`](Self::shutdown). Threaded backends return once terminated;
    /// cooperative backends return once shutdown has been requested and keep
    /// their heartbeat running in the background.
    ///
    /// # Errors
    /// Fails fast when the heartbeat cannot be armed.
    async fn wait_for_exit(
        self: Arc<Self>,
        force: bool,
        interval: Duration,
        request: ShutdownRequest,
    ) -> Result<(), RuntimeError>;
}
