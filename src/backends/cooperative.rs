//! # Cooperative backend: one control flow, host timers.
//!
//! [`CooperativeContext`] layers the whole contract on a [`Host`]'s
//! "run now / run after / clear" primitives plus an admission latch.
//!
//! ```text
//! execute(job)         ──► active? ──► host.run_now(guard(job))
//! schedule(job, d)     ──► active? ──► host.run_after(d, gate ─► guard(job)) ──► TimerToken
//! await_ready(probe)   ──► Awaitable(pause) ──► schedule ...
//! shutdown(_)          ──► latch closed (force ignored: nothing can be preempted)
//! wait_for_exit(..)    ──► heartbeat every `interval` on the host:
//!                            request()? ──► shutdown(force)
//!                            re-arm unconditionally
//!                          returns once the latch is closed
//! ```
//!
//! ## Limitations
//! - `is_terminated()` is always `false`: a single shared flow cannot observe that
//!   all derived work has drained. Anything still queued when `wait_for_exit`
//!   returns completes as fire-and-forget background work.
//! - Callbacks already handed to the host keep firing after shutdown; they check
//!   [`is_active`](PlatformContext::is_active) themselves if they must stop.
//! - The heartbeat is armed on the host directly, bypassing admission, and keeps
//!   ticking until the host itself stops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::{ContextConfig, MIN_PAUSE};
use crate::core::runner::{self, report};
use crate::core::{
    CancelRef, Inert, Job, PlatformContext, PlatformKind, ShutdownRequest, TimerGate, TimerToken,
};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::facade::{HookRef, default_hook};
use crate::hosts::Host;

/// Single-flow scheduling context over a [`Host`].
pub struct CooperativeContext<H: Host> {
    host: Arc<H>,
    cfg: ContextConfig,
    closed: CancellationToken,
    announced: AtomicBool,
    hook: HookRef,
    bus: Bus,
}

impl<H: Host> CooperativeContext<H> {
    /// Creates an active context over `host`.
    pub fn new(host: H, cfg: ContextConfig) -> Self {
        Self {
            host: Arc::new(host),
            bus: Bus::new(cfg.bus_capacity_clamped()),
            cfg,
            closed: CancellationToken::new(),
            announced: AtomicBool::new(false),
            hook: default_hook(),
        }
    }

    /// Replaces the failure hook.
    pub fn with_hook(mut self, hook: HookRef) -> Self {
        self.hook = hook;
        self
    }

    /// The host driving this context.
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    fn heartbeat(
        self: &Arc<Self>,
        force: bool,
        interval: Duration,
        request: Arc<Mutex<ShutdownRequest>>,
    ) -> Result<(), RuntimeError> {
        let ctx = Arc::clone(self);
        let tick: Job = Box::new(move || {
            let asked = {
                let mut request = request.lock();
                (*request)()
            };
            if asked {
                ctx.shutdown(force);
            }
            if let Err(err) = ctx.heartbeat(force, interval, Arc::clone(&request)) {
                report(&TaskError::fail(err.to_string()), ctx.hook.as_ref(), &ctx.bus);
            }
        });
        self.host.run_after(
            interval,
            runner::guard(tick, Arc::clone(&self.hook), self.bus.clone()),
        )?;
        Ok(())
    }
}

#[async_trait]
impl<H: Host> PlatformContext for CooperativeContext<H> {
    fn platform(&self) -> PlatformKind {
        self.host.platform()
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
        false
    }

    fn bus(&self) -> &Bus {
        &self.bus
    }

    fn report_failure(&self, err: &TaskError) {
        report(err, self.hook.as_ref(), &self.bus);
    }

    fn execute(&self, job: Job) {
        if !self.is_active() {
            self.bus.publish(Event::new(EventKind::TaskDropped));
            return;
        }
        self.host
            .run_now(runner::guard(job, Arc::clone(&self.hook), self.bus.clone()));
    }

    fn schedule(&self, job: Job, delay: Duration) -> Result<CancelRef, RuntimeError> {
        if !self.is_active() {
            self.bus
                .publish(Event::new(EventKind::TaskDropped).with_delay(delay));
            return Ok(Arc::new(Inert::default()));
        }

        let gate = Arc::new(TimerGate::new());
        let fire_gate = Arc::clone(&gate);
        let hook = Arc::clone(&self.hook);
        let bus = self.bus.clone();
        let timer = self.host.run_after(
            delay,
            Box::new(move || {
                if fire_gate.fire() {
                    runner::run_guarded(job, hook.as_ref(), &bus);
                }
            }),
        )?;

        let host = Arc::clone(&self.host);
        Ok(Arc::new(TimerToken::new(gate, self.bus.clone(), move || {
            host.clear(timer)
        })))
    }

    fn shutdown(&self, force: bool) {
        self.closed.cancel();
        if !self.announced.swap(true, Ordering::AcqRel) {
            self.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_force(force));
        }
    }

    async fn wait_for_exit(
        self: Arc<Self>,
        force: bool,
        interval: Duration,
        request: ShutdownRequest,
    ) -> Result<(), RuntimeError> {
        self.heartbeat(force, interval.max(MIN_PAUSE), Arc::new(Mutex::new(request)))?;
        self.closed.cancelled().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::{ManualHost, TokioHost};
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn manual(pause: u64) -> Arc<CooperativeContext<ManualHost>> {
        Arc::new(CooperativeContext::new(
            ManualHost::new(),
            ContextConfig::with_pause(ms(pause)),
        ))
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Job) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        let make = move || -> Job {
            let sink = Arc::clone(&sink);
            Box::new(move || {
                sink.fetch_add(1, Ordering::SeqCst);
            })
        };
        (hits, make)
    }

    fn explode() {
        panic!("actor failed");
    }

    #[test]
    fn descriptors() {
        let ctx = manual(10);
        assert_eq!(ctx.platform(), PlatformKind::CooperativeHost);
        assert_eq!(ctx.load(), 4);
        assert_eq!(ctx.pause(), ms(10));
        assert!(ctx.is_active());
        assert!(!ctx.is_terminated());

        let embedded = CooperativeContext::new(
            ManualHost::new().with_platform(PlatformKind::EmbeddedHost),
            ContextConfig::default(),
        );
        assert_eq!(embedded.platform(), PlatformKind::EmbeddedHost);
    }

    #[test]
    fn execute_runs_on_next_opportunity() {
        let ctx = manual(10);
        let (hits, job) = counter();

        ctx.execute(job());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        ctx.host().run_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn execute_after_shutdown_never_runs() {
        let ctx = manual(10);
        let mut rx = ctx.bus().subscribe();
        let (hits, job) = counter();

        ctx.shutdown(false);
        ctx.execute(job());
        ctx.execute(job());
        ctx.host().advance(ms(100));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!ctx.is_active());
        assert_eq!(rx.try_recv().expect("event").kind, EventKind::ShutdownRequested);
        assert_eq!(rx.try_recv().expect("event").kind, EventKind::TaskDropped);
    }

    #[test]
    fn scheduled_task_respects_delay() {
        let ctx = manual(10);
        let (hits, job) = counter();

        let token = ctx.schedule(job(), ms(5)).expect("schedule");
        ctx.host().advance(ms(4));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        ctx.host().advance(ms(2));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        token.cancel();
        assert!(!token.is_cancelled());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_before_delay_prevents_run() {
        let ctx = manual(10);
        let (hits, job) = counter();

        let token = ctx.schedule(job(), ms(5)).expect("schedule");
        ctx.host().advance(ms(3));
        token.cancel();
        token.cancel();
        ctx.host().advance(ms(100));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(token.is_cancelled());
        assert_eq!(ctx.host().pending(), 0);
    }

    #[test]
    fn schedule_after_shutdown_returns_inert_token() {
        let ctx = manual(10);
        let (hits, job) = counter();

        ctx.shutdown(true);
        let token = ctx.schedule(job(), ms(1)).expect("dropped, not failed");
        ctx.host().advance(ms(10));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.host().pending(), 0);
        token.cancel();
    }

    #[test]
    fn schedule_fails_fast_when_host_is_full() {
        let ctx = Arc::new(CooperativeContext::new(
            ManualHost::new().with_capacity(1),
            ContextConfig::default(),
        ));
        let (_, job) = counter();

        ctx.schedule(job(), ms(1)).expect("first timer");
        let err = ctx.schedule(job(), ms(1)).err().expect("exhausted");
        assert_eq!(err.as_label(), "runtime_timer_exhausted");
    }

    #[test]
    fn panicking_job_goes_to_hook_and_flow_survives() {
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failures);
        let ctx = Arc::new(
            CooperativeContext::new(ManualHost::new(), ContextConfig::default()).with_hook(
                Arc::new(move |err: &TaskError| sink.lock().push(err.clone())),
            ),
        );
        let (hits, job) = counter();

        ctx.execute(Box::new(explode));
        ctx.execute(job());
        ctx.host().run_pending();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            *failures.lock(),
            vec![TaskError::Panicked {
                message: "actor failed".into()
            }]
        );
    }

    #[test]
    fn await_fires_once_on_third_probe() {
        let ctx = manual(1);
        let probes = Arc::new(AtomicUsize::new(0));
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&probes);
        let out = Arc::clone(&delivered);
        let mut value = None;
        let probe = Box::new(move || {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 3 {
                value = Some(n);
            }
            match value.take() {
                Some(v) => {
                    out.lock().push(v);
                    true
                }
                None => false,
            }
        });
        let token = Arc::clone(&ctx).await_ready(probe).expect("await");

        ctx.host().advance(ms(2));
        assert!(delivered.lock().is_empty());

        ctx.host().advance(ms(20));
        assert_eq!(*delivered.lock(), vec![3]);
        assert_eq!(probes.load(Ordering::SeqCst), 3);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn wait_for_exit_latches_shutdown() {
        let ctx = manual(10);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let request: ShutdownRequest = Box::new(move || seen.fetch_add(1, Ordering::SeqCst) >= 2);

        let mut exit = Arc::clone(&ctx).wait_for_exit(false, ms(5), request);
        assert!(exit.as_mut().now_or_never().is_none());

        ctx.host().advance(ms(10));
        assert!(ctx.is_active());
        assert!(exit.as_mut().now_or_never().is_none());

        ctx.host().advance(ms(5));
        assert!(!ctx.is_active());
        assert!(matches!(exit.as_mut().now_or_never(), Some(Ok(()))));

        ctx.host().advance(ms(50));
        assert!(!ctx.is_active());
        assert!(!ctx.is_terminated());
        assert_eq!(ctx.host().pending(), 1);
    }

    #[test]
    fn wait_for_exit_returns_on_independent_shutdown() {
        let ctx = manual(10);
        let mut exit = Arc::clone(&ctx).wait_for_exit(true, ms(5), Box::new(|| false));
        assert!(exit.as_mut().now_or_never().is_none());

        ctx.shutdown(true);
        assert!(matches!(exit.as_mut().now_or_never(), Some(Ok(()))));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn runs_on_tokio_event_loop() {
        let ctx = Arc::new(CooperativeContext::new(
            TokioHost::current().expect("runtime"),
            ContextConfig::default(),
        ));
        let (hits, job) = counter();

        ctx.execute(job());
        let kept = ctx.schedule(job(), ms(5)).expect("schedule");
        let cancelled = ctx.schedule(job(), ms(5)).expect("schedule");
        cancelled.cancel();

        tokio::time::sleep(ms(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(!kept.is_cancelled());

        let flag = Arc::new(AtomicBool::new(false));
        let request = crate::core::flag_request(Arc::clone(&flag));
        let exit = tokio::spawn(Arc::clone(&ctx).wait_for_exit(false, ms(10), request));
        flag.store(true, Ordering::Release);

        exit.await.expect("join").expect("heartbeat armed");
        assert!(!ctx.is_active());
    }
}
