//! # platctx
//!
//! **platctx** is a small scheduling abstraction for actor runtimes. Actor code
//! submits work to a [`PlatformContext`] and stays unaware of whether the host
//! offers real worker threads or a single cooperative event loop.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    actor     │   │    actor     │   │    actor     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Platform (façade)                                                │
//! │  - future(task) ──► Promise<T>                                    │
//! │  - delayed(task, d), await_result(on_ready, attempt)              │
//! │  - FailureHook for work without a result channel                  │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  PlatformContext                                                  │
//! │  execute / schedule / await_ready / shutdown / wait_for_exit      │
//! │  platform / load / pause / is_active / is_terminated              │
//! └───────────┬──────────────────────────────────────┬────────────────┘
//!             ▼                                      ▼
//! ┌────────────────────────────┐        ┌──────────────────────────────┐
//! │ CooperativeContext<H>      │        │ ThreadedContext              │
//! │ one flow, host callbacks   │        │ tokio workers, TaskTracker,  │
//! │ (TokioHost, ManualHost)    │        │ load-limited semaphore       │
//! └────────────┬───────────────┘        └───────────────┬──────────────┘
//!              └──────────────┬─────────────────────────┘
//!                             ▼
//!              Bus (broadcast) ──► Platform::attach ──► SubscriberSet
//! ```
//!
//! ### Polling without blocking
//! ```text
//! await_ready(probe)
//!   └─► schedule(fire, pause)
//!         fire: probe() ── true  ──► stop, publish ProbeReady
//!                       └─ false ──► schedule(fire, pause) again
//!   token.cancel() ──► cancel the pending timer, publish ProbeCanceled
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                           |
//! |-------------------|--------------------------------------------------------------|----------------------------------------------|
//! | **Contract**      | Backend-independent scheduling surface.                      | [`PlatformContext`], [`PlatformKind`]        |
//! | **Backends**      | Single-flow and multi-worker implementations.                | [`CooperativeContext`], [`ThreadedContext`]  |
//! | **Hosts**         | Event loops the cooperative backend runs on.                 | [`Host`], [`TokioHost`], [`ManualHost`]      |
//! | **Façade**        | Promise-returning and delayed helpers for actors.            | [`Platform`], [`Promise`], [`FailureHook`]   |
//! | **Cancellation**  | Tokens returned by `schedule` and `await_ready`.             | [`Cancellable`], [`CancelRef`]               |
//! | **Subscriber API**| Observe drops, failures, shutdown.                           | [`Subscribe`], [`Event`]                     |
//! | **Errors**        | Typed administrative and per-task errors.                    | [`RuntimeError`], [`TaskError`]              |
//! | **Configuration** | Pause, load and bus capacity.                                | [`ContextConfig`]                            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use platctx::{ContextConfig, Platform, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = Platform::threaded(ContextConfig::default())?;
//!
//!     let answer = platform.future(|| Ok::<_, TaskError>(6 * 7)).await?;
//!     assert_eq!(answer, 42);
//!
//!     platform.delayed(|| {
//!         println!("tick");
//!         Ok(())
//!     }, Duration::from_millis(5))?;
//!
//!     platform
//!         .wait_for_exit(false, Duration::from_millis(10), Box::new(|| true))
//!         .await?;
//!     Ok(())
//! }
//! ```
mod backends;
mod config;
mod core;
mod error;
mod events;
mod facade;
mod hosts;
mod subscribers;

// ---- Public re-exports ----

pub use crate::backends::{CooperativeContext, ThreadedContext};
pub use crate::config::{ContextConfig, MIN_PAUSE};
pub use crate::core::{
    Awaitable, CancelRef, Cancellable, ContextRef, Inert, Job, PlatformContext, PlatformKind,
    Probe, ShutdownRequest, TimerGate, TimerToken, flag_request, signal_request,
};
pub use crate::error::{RuntimeError, TaskError};
pub use crate::events::{Bus, Event, EventKind};
pub use crate::facade::{FailureHook, HookRef, Platform, PrintFailure, Promise, default_hook};
pub use crate::hosts::{Host, ManualHost, TimerId, TokioHost};
pub use crate::subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use crate::subscribers::LogWriter;
