//! # Awaitable: poll-until-ready built from `schedule` + `cancel`.
//!
//! A self-rescheduling cancellable token that evaluates a [`Probe`] once per
//! `delay` until it reports ready or is cancelled. It never touches host
//! primitives directly, so it works unchanged on every backend.
//!
//! ## State machine
//! ```text
//!            probe → false (re-arm)
//!              ┌───────┐
//!              ▼       │
//! start ──► Pending ───┘
//!              │
//!              ├── probe → true ──────► Stopped { cancelled: false }
//!              ├── cancel() ──────────► Stopped { cancelled: true }
//!              └── context closed ────► Stopped { cancelled: false }
//! ```
//! `Stopped` is terminal.
//!
//! ## Rules
//! - Fires are strictly sequential: the next probe is armed only after the current
//!   one returned.
//! - Every fire re-reads the phase before probing and before arming, so a cancel
//!   that races with an in-flight fire still prevents all later ticks.
//! - A timer armed after `cancel()` slipped in is cancelled immediately.
//! - A panicking probe is a caller bug: the backend's guard reports it and the
//!   awaitable stays idle forever (no timer pending).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::cancel::{CancelRef, Cancellable};
use crate::core::context::{PlatformContext, Probe};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Event, EventKind};

enum Phase {
    Pending {
        /// Arm generation that owns `timer`.
        generation: u64,
        timer: Option<CancelRef>,
    },
    Stopped {
        cancelled: bool,
    },
}

struct AwaitState {
    phase: Phase,
    probes: u32,
}

/// Poll-until-ready token. See the module docs for the state machine.
pub struct Awaitable<C: ?Sized> {
    ctx: Arc<C>,
    delay: Duration,
    state: Mutex<AwaitState>,
    probe: Mutex<Probe>,
}

impl<C: PlatformContext + ?Sized> Awaitable<C> {
    /// Creates the awaitable and arms the first probe `delay` from now.
    ///
    /// # Errors
    /// Propagates the failure to schedule the first probe.
    pub fn start(ctx: Arc<C>, delay: Duration, probe: Probe) -> Result<Arc<Self>, RuntimeError> {
        let this = Arc::new(Self {
            ctx,
            delay,
            state: Mutex::new(AwaitState {
                phase: Phase::Pending {
                    generation: 0,
                    timer: None,
                },
                probes: 0,
            }),
            probe: Mutex::new(probe),
        });
        Self::arm(&this)?;
        Ok(this)
    }

    /// Number of probes evaluated so far.
    pub fn probes(&self) -> u32 {
        self.state.lock().probes
    }

    /// True while further probes may run.
    pub fn is_pending(&self) -> bool {
        matches!(self.state.lock().phase, Phase::Pending { .. })
    }

    fn arm(this: &Arc<Self>) -> Result<(), RuntimeError> {
        let generation = {
            let mut state = this.state.lock();
            match &mut state.phase {
                Phase::Pending { generation, .. } => {
                    *generation += 1;
                    *generation
                }
                Phase::Stopped { .. } => return Ok(()),
            }
        };

        if !this.ctx.is_active() {
            this.state.lock().phase = Phase::Stopped { cancelled: false };
            return Ok(());
        }

        let next = Arc::clone(this);
        let timer = this
            .ctx
            .schedule(Box::new(move || Self::fire(&next)), this.delay)?;

        let mut state = this.state.lock();
        match &mut state.phase {
            Phase::Pending {
                generation: current,
                timer: slot,
            } if *current == generation => {
                *slot = Some(timer);
            }
            // A newer arm exists, so this timer has already fired.
            Phase::Pending { .. } => {}
            Phase::Stopped { .. } => {
                drop(state);
                timer.cancel();
            }
        }
        Ok(())
    }

    fn fire(this: &Arc<Self>) {
        let attempt = {
            let mut state = this.state.lock();
            if !matches!(state.phase, Phase::Pending { .. }) {
                return;
            }
            state.probes += 1;
            state.probes
        };

        let ready = {
            let mut probe = this.probe.lock();
            (*probe)()
        };

        if ready {
            let mut state = this.state.lock();
            if matches!(state.phase, Phase::Pending { .. }) {
                state.phase = Phase::Stopped { cancelled: false };
            }
            drop(state);
            this.ctx
                .bus()
                .publish(Event::new(EventKind::ProbeReady).with_attempt(attempt));
            return;
        }

        if let Err(err) = Self::arm(this) {
            this.state.lock().phase = Phase::Stopped { cancelled: false };
            this.ctx.report_failure(&TaskError::fail(err.to_string()));
        }
    }
}

impl<C: PlatformContext + ?Sized> Cancellable for Awaitable<C> {
    fn cancel(&self) {
        let (timer, probes) = {
            let mut state = self.state.lock();
            let timer = match &mut state.phase {
                Phase::Pending { timer, .. } => timer.take(),
                Phase::Stopped { .. } => return,
            };
            state.phase = Phase::Stopped { cancelled: true };
            (timer, state.probes)
        };

        if let Some(timer) = timer {
            timer.cancel();
        }
        self.ctx
            .bus()
            .publish(Event::new(EventKind::ProbeCanceled).with_attempt(probes));
    }

    fn is_cancelled(&self) -> bool {
        matches!(
            self.state.lock().phase,
            Phase::Stopped { cancelled: true }
        )
    }
}
