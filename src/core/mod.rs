//! Scheduling core: the contract and the pieces every backend shares.
//!
//! Internal modules:
//! - [`context`]: the [`PlatformContext`] contract, [`PlatformKind`] and job/probe types;
//! - [`cancel`]: cancellation tokens and the fire-or-cancel timer gate;
//! - [`awaitable`]: the poll-until-ready state machine behind `await_ready`;
//! - [`runner`]: runs one job with panic isolation and failure reporting;
//! - [`shutdown`]: shutdown requests (flags, OS signals) for `wait_for_exit`.

pub(crate) mod awaitable;
pub(crate) mod cancel;
pub(crate) mod context;
pub(crate) mod runner;
pub(crate) mod shutdown;

pub use awaitable::Awaitable;
pub use cancel::{CancelRef, Cancellable, Inert, TimerGate, TimerToken};
pub use context::{ContextRef, Job, PlatformContext, PlatformKind, Probe, ShutdownRequest};
pub use shutdown::{flag_request, signal_request};
