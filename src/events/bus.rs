//! # Event bus for broadcasting context events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]. Every scheduling context owns one and
//! publishes from whatever flow it is on: a tokio worker, a host timer callback,
//! or the caller of `shutdown`.
//!
//! ```text
//! Publishers:                          Receivers:
//!   execute/schedule (dropped work) ─┐
//!   runner guard (failed bodies)    ─┼──► Bus ──► Platform::attach listener ──► SubscriberSet
//!   Awaitable (ready / cancelled)   ─┤        └──► any `subscribe()` caller
//!   shutdown / wait_for_exit        ─┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and does not need a runtime, so the manual host can
//!   publish from plain threads.
//! - A single ring buffer of `capacity` events is shared by all receivers; a
//!   receiver that falls behind observes `RecvError::Lagged(n)`.
//! - Events sent while nobody is subscribed are lost.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for context events.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers (fire-and-forget).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
