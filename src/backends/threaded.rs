//! # Threaded backend: tokio workers.
//!
//! [`ThreadedContext`] runs bodies on a tokio runtime. Every admitted task is
//! tracked by a [`TaskTracker`] so the context can tell when it has drained.
//!
//! ```text
//! execute(job)       ──► tracker.spawn ──► [permit (load)] ──► guard(job)
//! schedule(job, d)   ──► tracker.spawn ──► sleep(d) ─┬─► [permit] ──► gate.fire()? ──► guard(job)
//!                                                    └─◄ timer token cancelled / forced shutdown
//! shutdown(force)    ──► closed.cancel(), tracker.close()
//!                        force: forced.cancel() → drops pending timers and permit waiters
//! is_terminated()    ──► closed && tracker empty
//! wait_for_exit(..)  ──► every `interval`: request()? → shutdown(force); terminated? → return
//! ```
//!
//! ## Force semantics
//! - `force = false`: admission closes; everything already admitted (including
//!   timers still sleeping) runs to completion.
//! - `force = true`: additionally, timers that have not fired and tasks still
//!   waiting for a permit are dropped. A body that already started is never
//!   interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::select;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{ContextConfig, MIN_PAUSE};
use crate::core::runner;
use crate::core::{
    CancelRef, Inert, Job, PlatformContext, PlatformKind, ShutdownRequest, TimerGate, TimerToken,
};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::facade::{HookRef, default_hook};

/// Multi-worker scheduling context on a tokio runtime.
pub struct ThreadedContext {
    handle: Handle,
    cfg: ContextConfig,
    closed: CancellationToken,
    forced: CancellationToken,
    announced: AtomicBool,
    tracker: TaskTracker,
    semaphore: Option<Arc<Semaphore>>,
    hook: HookRef,
    bus: Bus,
}

impl ThreadedContext {
    /// Creates a context on the runtime of the calling thread.
    ///
    /// # Errors
    /// [`RuntimeError::NoRuntime`] outside a tokio runtime.
    pub fn new(cfg: ContextConfig) -> Result<Self, RuntimeError> {
        let handle = Handle::try_current().map_err(|e| RuntimeError::NoRuntime {
            reason: e.to_string(),
        })?;
        Ok(Self::with_handle(handle, cfg))
    }

    /// Creates a context on an explicit runtime handle.
    pub fn with_handle(handle: Handle, cfg: ContextConfig) -> Self {
        Self {
            handle,
            semaphore: cfg
                .concurrency_limit()
                .map(Semaphore::new)
                .map(Arc::new),
            bus: Bus::new(cfg.bus_capacity_clamped()),
            cfg,
            closed: CancellationToken::new(),
            forced: CancellationToken::new(),
            announced: AtomicBool::new(false),
            tracker: TaskTracker::new(),
            hook: default_hook(),
        }
    }

    /// Replaces the failure hook.
    pub fn with_hook(mut self, hook: HookRef) -> Self {
        self.hook = hook;
        self
    }

    /// Number of admitted tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

/// Waits for a concurrency permit unless `stop` fires first.
///
/// `Err(())` means the task must be dropped.
async fn admit(
    semaphore: Option<Arc<Semaphore>>,
    stop: &CancellationToken,
) -> Result<Option<OwnedSemaphorePermit>, ()> {
    let Some(sem) = semaphore else {
        return Ok(None);
    };
    select! {
        biased;
        _ = stop.cancelled() => Err(()),
        permit = sem.acquire_owned() => permit.map(Some).map_err(|_closed| ()),
    }
}

#[async_trait]
impl PlatformContext for ThreadedContext {
    fn platform(&self) -> PlatformKind {
        PlatformKind::ThreadedHost
    }

    fn load(&self) -> usize {
        self.cfg.load
    }

    fn pause(&self) -> Duration {
        self.cfg.pause_clamped()
    }

    fn is_active(&self) -> bool {
        !self.closed.is_cancelled()
    }

    fn is_terminated(&self) -> bool {
        self.closed.is_cancelled() && self.tracker.is_closed() && self.tracker.is_empty()
    }

    fn bus(&self) -> &Bus {
        &self.bus
    }

    fn report_failure(&self, err: &TaskError) {
        runner::report(err, self.hook.as_ref(), &self.bus);
    }

    fn execute(&self, job: Job) {
        if !self.is_active() {
            self.bus.publish(Event::new(EventKind::TaskDropped));
            return;
        }

        let semaphore = self.semaphore.clone();
        let forced = self.forced.clone();
        let hook = Arc::clone(&self.hook);
        let bus = self.bus.clone();
        self.tracker.spawn_on(
            async move {
                let Ok(_permit) = admit(semaphore, &forced).await else {
                    return;
                };
                runner::run_guarded(job, hook.as_ref(), &bus);
            },
            &self.handle,
        );
    }

    fn schedule(&self, job: Job, delay: Duration) -> Result<CancelRef, RuntimeError> {
        if !self.is_active() {
            self.bus
                .publish(Event::new(EventKind::TaskDropped).with_delay(delay));
            return Ok(Arc::new(Inert::default()));
        }
        let deadline = Instant::now()
            .checked_add(delay)
            .ok_or(RuntimeError::InvalidDelay { delay })?;

        let gate = Arc::new(TimerGate::new());
        let wake = self.forced.child_token();

        let fire_gate = Arc::clone(&gate);
        let stop = wake.clone();
        let semaphore = self.semaphore.clone();
        let hook = Arc::clone(&self.hook);
        let bus = self.bus.clone();
        self.tracker.spawn_on(
            async move {
                select! {
                    biased;
                    _ = stop.cancelled() => return,
                    _ = sleep_until(deadline) => {}
                }
                let Ok(_permit) = admit(semaphore, &stop).await else {
                    return;
                };
                if fire_gate.fire() {
                    runner::run_guarded(job, hook.as_ref(), &bus);
                }
            },
            &self.handle,
        );

        Ok(Arc::new(TimerToken::new(gate, self.bus.clone(), move || {
            wake.cancel()
        })))
    }

    fn shutdown(&self, force: bool) {
        self.closed.cancel();
        self.tracker.close();
        if force {
            self.forced.cancel();
        }
        if !self.announced.swap(true, Ordering::AcqRel) {
            self.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_force(force));
        }
    }

    async fn wait_for_exit(
        self: Arc<Self>,
        force: bool,
        interval: Duration,
        mut request: ShutdownRequest,
    ) -> Result<(), RuntimeError> {
        let interval = interval.max(MIN_PAUSE);
        loop {
            if self.is_active() && request() {
                self.shutdown(force);
            }
            if self.is_terminated() {
                break;
            }
            sleep(interval).await;
        }
        self.bus.publish(Event::new(EventKind::Terminated));
        Ok(())
    }
}
