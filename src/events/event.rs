//! # Runtime events emitted by scheduling contexts.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Admission events**: work dropped after shutdown, task bodies that failed
//! - **Polling events**: awaitables that resolved or were cancelled
//! - **Lifecycle events**: shutdown requested, context terminated
//!
//! The [`Event`] struct carries additional metadata such as timestamps, delays,
//! probe counts and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use platctx::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ProbeReady).with_attempt(3);
//!
//! assert_eq!(ev.kind, EventKind::ProbeReady);
//! assert_eq!(ev.attempt, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What happened. The fields an event fills in are listed per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A subscriber panicked while handling an event (`reason`).
    SubscriberPanicked,
    /// A subscriber queue rejected an event (`reason`: name, full/closed).
    SubscriberOverflow,

    /// Work submitted to a closed context was discarded (`delay_ms` for `schedule`).
    TaskDropped,
    /// A body without a result channel panicked or returned an error (`reason`).
    TaskFailed,
    /// A timer was cancelled before it fired.
    TimerCanceled,

    /// An awaitable delivered its result (`attempt`: 1-based probe number).
    ProbeReady,
    /// An awaitable was cancelled while pending (`attempt`: probes so far).
    ProbeCanceled,

    /// Admission closed (`force`). Published once per context.
    ShutdownRequested,
    /// Admission closed and every admitted task finished. Threaded contexts only.
    Terminated,
}

/// One published event. Optional fields depend on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Requested delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Probe count (starting from 1).
    pub attempt: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Shutdown mode, for `ShutdownRequested`.
    pub force: Option<bool>,
}

impl Event {
    /// Stamps a new event with the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            delay_ms: None,
            attempt: None,
            reason: None,
            force: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a probe count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the shutdown mode.
    #[inline]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    pub(crate) fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}
