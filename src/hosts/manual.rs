//! # Manually driven host with a virtual clock.
//!
//! [`ManualHost`] is a deterministic single-flow event loop. Nothing runs until the
//! owner drives it, which suits two situations:
//! - embedded drivers that call [`ManualHost::advance`] from a hardware tick;
//! - tests that need exact control over time.
//!
//! ## Ordering
//! Callbacks fire in `(due time, submission order)`. `run_now` queues at the
//! current virtual time, after everything already due now.
//!
//! ## Rules
//! - Callbacks run **outside** the internal lock, so they may submit more work;
//!   work they submit that falls due before the target time runs in the same `advance`.
//! - A callback that re-arms itself with a zero delay keeps `advance` busy forever;
//!   contexts clamp their own cadences to at least 1ms for that reason.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::{Job, PlatformKind};
use crate::error::RuntimeError;
use crate::hosts::Host;

/// Opaque handle of a pending callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due: Duration,
    seq: u64,
}

impl TimerId {
    /// Virtual time at which the callback is due.
    pub fn due(&self) -> Duration {
        self.due
    }
}

struct ManualState {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<TimerId, Job>,
}

/// Virtual-clock host.
pub struct ManualHost {
    platform: PlatformKind,
    capacity: Option<usize>,
    state: Mutex<ManualState>,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    /// Creates a host at virtual time zero reporting [`PlatformKind::CooperativeHost`].
    pub fn new() -> Self {
        Self {
            platform: PlatformKind::CooperativeHost,
            capacity: None,
            state: Mutex::new(ManualState {
                now: Duration::ZERO,
                next_seq: 0,
                queue: BTreeMap::new(),
            }),
        }
    }

    /// Overrides the reported execution model, e.g. [`PlatformKind::EmbeddedHost`]
    /// for a hardware tick driver.
    pub fn with_platform(mut self, platform: PlatformKind) -> Self {
        self.platform = platform;
        self
    }

    /// Limits the number of callbacks that may be pending at once.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of callbacks waiting to run.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Moves the clock forward by `by`, running every callback that falls due.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = {
            let state = self.state.lock();
            state.now.saturating_add(by)
        };
        let ran = self.drain_until(target);
        let mut state = self.state.lock();
        state.now = state.now.max(target);
        ran
    }

    /// Runs callbacks due at the current time without moving the clock.
    pub fn run_pending(&self) -> usize {
        let now = self.now();
        self.drain_until(now)
    }

    fn drain_until(&self, target: Duration) -> usize {
        let mut ran = 0;
        while let Some(job) = self.pop_due(target) {
            job();
            ran += 1;
        }
        ran
    }

    fn pop_due(&self, target: Duration) -> Option<Job> {
        let mut state = self.state.lock();
        let due = state.queue.first_key_value().map(|(id, _)| id.due)?;
        if due > target {
            return None;
        }
        let (id, job) = state.queue.pop_first()?;
        state.now = state.now.max(id.due);
        Some(job)
    }

    fn enqueue(state: &mut ManualState, due: Duration, job: Job) -> TimerId {
        let id = TimerId {
            due,
            seq: state.next_seq,
        };
        state.next_seq += 1;
        state.queue.insert(id, job);
        id
    }
}

impl Host for ManualHost {
    type Timer = TimerId;

    fn platform(&self) -> PlatformKind {
        self.platform
    }

    fn run_now(&self, job: Job) {
        let mut state = self.state.lock();
        let now = state.now;
        Self::enqueue(&mut state, now, job);
    }

    fn run_after(&self, delay: Duration, job: Job) -> Result<TimerId, RuntimeError> {
        let mut state = self.state.lock();
        if let Some(capacity) = self.capacity {
            if state.queue.len() >= capacity {
                return Err(RuntimeError::TimerExhausted { capacity });
            }
        }
        let due = state
            .now
            .checked_add(delay)
            .ok_or(RuntimeError::InvalidDelay { delay })?;
        Ok(Self::enqueue(&mut state, due, job))
    }

    fn clear(&self, timer: TimerId) {
        self.state.lock().queue.remove(&timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Job) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |name: &'static str| -> Job {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().push(name))
        };
        (log, make)
    }

    #[test]
    fn fires_in_due_then_submission_order() {
        let host = ManualHost::new();
        let (log, job) = recorder();

        host.run_after(Duration::from_millis(5), job("late")).expect("timer");
        host.run_after(Duration::from_millis(1), job("early-a")).expect("timer");
        host.run_after(Duration::from_millis(1), job("early-b")).expect("timer");
        host.run_now(job("now"));

        assert_eq!(host.advance(Duration::from_millis(4)), 3);
        assert_eq!(*log.lock(), vec!["now", "early-a", "early-b"]);
        assert_eq!(host.now(), Duration::from_millis(4));

        assert_eq!(host.advance(Duration::from_millis(1)), 1);
        assert_eq!(log.lock().last(), Some(&"late"));
    }

    #[test]
    fn cleared_timer_is_gone() {
        let host = ManualHost::new();
        let (log, job) = recorder();

        let id = host.run_after(Duration::from_millis(3), job("x")).expect("timer");
        assert_eq!(id.due(), Duration::from_millis(3));
        host.clear(id);
        host.clear(id);

        assert_eq!(host.advance(Duration::from_millis(10)), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn callbacks_may_submit_more_work() {
        let host = Arc::new(ManualHost::new());
        let (log, job) = recorder();
        let inner = Arc::clone(&host);
        let follow_up = job("follow-up");

        host.run_after(
            Duration::from_millis(2),
            Box::new(move || {
                inner
                    .run_after(Duration::from_millis(2), follow_up)
                    .expect("timer");
            }),
        )
        .expect("timer");

        assert_eq!(host.advance(Duration::from_millis(5)), 2);
        assert_eq!(*log.lock(), vec!["follow-up"]);
    }

    #[test]
    fn run_pending_does_not_move_clock() {
        let host = ManualHost::new();
        let (log, job) = recorder();

        host.run_now(job("now"));
        host.run_after(Duration::from_millis(1), job("later")).expect("timer");

        assert_eq!(host.run_pending(), 1);
        assert_eq!(host.now(), Duration::ZERO);
        assert_eq!(*log.lock(), vec!["now"]);
        assert_eq!(host.pending(), 1);
    }

    #[test]
    fn fails_fast_on_capacity_and_overflow() {
        let host = ManualHost::new().with_capacity(1);
        host.run_after(Duration::from_millis(1), Box::new(|| {})).expect("timer");

        let err = host
            .run_after(Duration::from_millis(1), Box::new(|| {}))
            .expect_err("exhausted");
        assert_eq!(err.as_label(), "runtime_timer_exhausted");

        let host = ManualHost::new();
        host.advance(Duration::from_secs(1));
        let err = host
            .run_after(Duration::MAX, Box::new(|| {}))
            .expect_err("overflow");
        assert_eq!(err.as_label(), "runtime_invalid_delay");
    }

    #[test]
    fn reports_configured_platform() {
        assert_eq!(ManualHost::new().platform(), PlatformKind::CooperativeHost);
        let embedded = ManualHost::default().with_platform(PlatformKind::EmbeddedHost);
        assert_eq!(embedded.platform(), PlatformKind::EmbeddedHost);
    }
}
