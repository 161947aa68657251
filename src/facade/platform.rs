//! # Actor-facing handle.
//!
//! [`Platform`] is a cloneable handle around one [`PlatformContext`]. Actor code
//! receives it explicitly and never touches the backend type.
//!
//! ```text
//! Platform::future(task)         ──► execute(catch_unwind(task) ──► resolver) ──► Promise<T>
//! Platform::delayed(task, d)     ──► schedule(task()? else hook, d)            ──► CancelRef
//! Platform::await_result(r, a)   ──► await_ready(probe: a()? → r(value) once)  ──► CancelRef
//! Platform::attach(subscribers)  ──► bus listener ──► SubscriberSet
//! ```
//!
//! Every helper submits through the context, so admission and shutdown rules
//! apply to them exactly as to raw `execute`/`schedule`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::backends::{CooperativeContext, ThreadedContext};
use crate::config::ContextConfig;
use crate::core::runner::panic_message;
use crate::core::{CancelRef, ContextRef, PlatformContext, PlatformKind, Probe, ShutdownRequest};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, EventKind};
use crate::facade::Promise;
use crate::hosts::Host;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Shared handle to a scheduling context.
#[derive(Clone)]
pub struct Platform {
    ctx: ContextRef,
}

impl Platform {
    /// Wraps an existing context.
    pub fn new(ctx: ContextRef) -> Self {
        Self { ctx }
    }

    /// Cooperative context over `host`.
    pub fn cooperative<H: Host>(host: H, cfg: ContextConfig) -> Self {
        Self::new(Arc::new(CooperativeContext::new(host, cfg)))
    }

    /// Threaded context on the current tokio runtime.
    ///
    /// # Errors
    /// [`RuntimeError::NoRuntime`] outside a tokio runtime.
    pub fn threaded(cfg: ContextConfig) -> Result<Self, RuntimeError> {
        Ok(Self::new(Arc::new(ThreadedContext::new(cfg)?)))
    }

    /// The underlying context.
    pub fn context(&self) -> &ContextRef {
        &self.ctx
    }

    /// Execution model of the context.
    pub fn platform(&self) -> PlatformKind {
        self.ctx.platform()
    }

    /// Advisory concurrency factor.
    pub fn load(&self) -> usize {
        self.ctx.load()
    }

    /// Natural polling interval of `await_result`.
    pub fn pause(&self) -> Duration {
        self.ctx.pause()
    }

    /// `false` once shutdown was requested.
    pub fn is_active(&self) -> bool {
        self.ctx.is_active()
    }

    /// `true` once shut down and drained (threaded contexts only).
    pub fn is_terminated(&self) -> bool {
        self.ctx.is_terminated()
    }

    /// Event bus of the context.
    pub fn bus(&self) -> &Bus {
        self.ctx.bus()
    }

    /// Runs `job` at the next opportunity. Dropped after shutdown.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.ctx.execute(Box::new(job));
    }

    /// Runs `job` after `delay`.
    ///
    /// # Errors
    /// Fails fast when the timer cannot be armed.
    pub fn schedule<F>(&self, job: F, delay: Duration) -> Result<CancelRef, RuntimeError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.ctx.schedule(Box::new(job), delay)
    }

    /// Runs `task` after `time`; an `Err` goes to the context's failure hook.
    ///
    /// # Errors
    /// Fails fast when the timer cannot be armed.
    pub fn delayed<F>(&self, task: F, time: Duration) -> Result<CancelRef, RuntimeError>
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        let ctx = Arc::downgrade(&self.ctx);
        self.ctx.schedule(
            Box::new(move || {
                if let Err(err) = task() {
                    if let Some(ctx) = ctx.upgrade() {
                        ctx.report_failure(&err);
                    }
                }
            }),
            time,
        )
    }

    /// Polls `attempt` every [`pause`](Self::pause) and hands its first value to
    /// `on_ready`, exactly once.
    ///
    /// # Errors
    /// Fails fast when the first probe cannot be scheduled.
    pub fn await_result<T, R, A>(
        &self,
        on_ready: R,
        mut attempt: A,
    ) -> Result<CancelRef, RuntimeError>
    where
        R: FnOnce(T) + Send + 'static,
        A: FnMut() -> Option<T> + Send + 'static,
    {
        let mut on_ready = Some(on_ready);
        let probe: Probe = Box::new(move || {
            let Some(value) = attempt() else {
                return false;
            };
            if let Some(deliver) = on_ready.take() {
                deliver(value);
            }
            true
        });
        Arc::clone(&self.ctx).await_ready(probe)
    }

    /// Runs `task` through `execute` and returns its eventual result.
    ///
    /// `task` never runs on the caller's flow. A panic resolves the promise to
    /// [`TaskError::Panicked`]. A task refused after shutdown resolves to
    /// [`TaskError::Dropped`]; one admitted and then discarded (forced shutdown)
    /// resolves to [`TaskError::Canceled`].
    pub fn future<T, F>(&self, task: F) -> Promise<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let (resolver, promise) = Promise::channel();
        let admitted = resolver.admission();
        self.ctx.execute(Box::new(move || {
            let res = match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(res) => res,
                Err(payload) => Err(TaskError::Panicked {
                    message: panic_message(&*payload),
                }),
            };
            resolver.resolve(res);
        }));
        // A refused job is dropped inside `execute`, before this point.
        admitted.store(true, Ordering::Release);
        promise
    }

    /// Closes admission.
    pub fn shutdown(&self, force: bool) {
        self.ctx.shutdown(force);
    }

    /// Final action of the controlling flow; see [`PlatformContext::wait_for_exit`].
    ///
    /// # Errors
    /// Fails fast when the heartbeat cannot be armed.
    pub async fn wait_for_exit(
        &self,
        force: bool,
        interval: Duration,
        request: ShutdownRequest,
    ) -> Result<(), RuntimeError> {
        Arc::clone(&self.ctx)
            .wait_for_exit(force, interval, request)
            .await
    }

    /// Forwards bus events to `subscribers` until the context is done.
    ///
    /// The listener stops after delivering `Terminated` (threaded) or
    /// `ShutdownRequested` (single-flow hosts, which never terminate), then
    /// drains the subscriber queues. Must be called inside a tokio runtime.
    pub fn attach(&self, subscribers: Vec<Arc<dyn Subscribe>>) -> JoinHandle<()> {
        let bus = self.ctx.bus().clone();
        let mut rx = bus.subscribe();
        let last = if self.platform().is_threaded() {
            EventKind::Terminated
        } else {
            EventKind::ShutdownRequested
        };
        let set = SubscriberSet::new(subscribers, bus);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.kind == last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }
}
