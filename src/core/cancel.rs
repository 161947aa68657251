//! # Cancellation tokens.
//!
//! Every scheduled or polling activity hands back a [`CancelRef`]. `cancel()` is
//! idempotent and safe after the activity already completed.
//!
//! [`TimerToken`] owns exactly one outstanding host timer. Its [`TimerGate`] is a
//! three-state latch shared with the timer callback:
//!
//! ```text
//! ARMED ──fire()──► FIRED       (callback runs the job)
//!   └───cancel()──► CANCELLED   (callback finds the gate closed and skips the job)
//! ```
//!
//! Whichever transition wins the compare-and-swap decides; a cancel that loses
//! is a no-op, a fire that loses never runs the job.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;

use crate::events::{Bus, Event, EventKind};

/// Abortable handle for a scheduled or polling activity.
pub trait Cancellable: Send + Sync + 'static {
    /// Prevents all future fires. Idempotent.
    fn cancel(&self);

    /// True once `cancel()` took effect.
    fn is_cancelled(&self) -> bool;
}

/// Shared cancellation handle.
pub type CancelRef = Arc<dyn Cancellable>;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Fire-or-cancel latch shared between a token and its timer callback.
#[derive(Debug, Default)]
pub struct TimerGate(AtomicU8);

impl TimerGate {
    /// Creates an armed gate.
    pub fn new() -> Self {
        Self(AtomicU8::new(ARMED))
    }

    /// Claims the gate for the callback. `false` means the job must not run.
    pub fn fire(&self) -> bool {
        self.transition(FIRED)
    }

    /// Claims the gate for cancellation. `false` means it already fired or was cancelled.
    pub fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    /// True if the callback claimed the gate.
    pub fn has_fired(&self) -> bool {
        self.0.load(Ordering::Acquire) == FIRED
    }

    /// True if cancellation claimed the gate.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire) == CANCELLED
    }

    fn transition(&self, to: u8) -> bool {
        self.0
            .compare_exchange(ARMED, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

type Clear = Box<dyn FnOnce() + Send + 'static>;

/// Token for one host timer.
pub struct TimerToken {
    gate: Arc<TimerGate>,
    clear: Mutex<Option<Clear>>,
    bus: Bus,
}

impl TimerToken {
    /// Wraps a gate and the host-specific action that releases the timer.
    pub fn new<F>(gate: Arc<TimerGate>, bus: Bus, clear: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            gate,
            clear: Mutex::new(Some(Box::new(clear))),
            bus,
        }
    }

    /// True if the timer callback ran its job.
    pub fn has_fired(&self) -> bool {
        self.gate.has_fired()
    }
}

impl Cancellable for TimerToken {
    fn cancel(&self) {
        if !self.gate.cancel() {
            return;
        }
        if let Some(clear) = self.clear.lock().take() {
            clear();
        }
        self.bus.publish(Event::new(EventKind::TimerCanceled));
    }

    fn is_cancelled(&self) -> bool {
        self.gate.is_cancelled()
    }
}

/// Token for work that was never admitted.
#[derive(Debug, Default)]
pub struct Inert {
    cancelled: AtomicBool,
}

impl Cancellable for Inert {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn gate_fire_wins_once() {
        let gate = TimerGate::new();
        assert!(gate.fire());
        assert!(!gate.fire());
        assert!(!gate.cancel());
        assert!(gate.has_fired());
        assert!(!gate.is_cancelled());
    }

    #[test]
    fn gate_cancel_blocks_fire() {
        let gate = TimerGate::new();
        assert!(gate.cancel());
        assert!(!gate.fire());
        assert!(gate.is_cancelled());
    }

    #[test]
    fn token_clears_once_and_reports() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let clears = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&clears);
        let token = TimerToken::new(Arc::new(TimerGate::new()), bus, move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        token.cancel();

        assert!(token.is_cancelled());
        assert_eq!(clears.load(Ordering::SeqCst), 1);
        assert_eq!(rx.try_recv().expect("event").kind, EventKind::TimerCanceled);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let gate = Arc::new(TimerGate::new());
        let clears = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&clears);
        let token = TimerToken::new(Arc::clone(&gate), Bus::new(1), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(gate.fire());
        token.cancel();

        assert!(token.has_fired());
        assert!(!token.is_cancelled());
        assert_eq!(clears.load(Ordering::SeqCst), 0);
    }
}
