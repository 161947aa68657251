//! # Run a single job with failure isolation.
//!
//! Every job that reaches a backend passes through [`run_guarded`]:
//!
//! ```text
//! Success:
//!   job() → returns normally → nothing published
//!
//! Failure:
//!   job() → panics → catch_unwind → TaskError::Panicked
//!                                 → FailureHook::on_failure(&err)
//!                                 → publish TaskFailed
//! ```
//!
//! ## Rules
//! - A failing body never unwinds into the scheduler, the host loop, or other tasks.
//! - Failures are reported **exactly once**, to the hook first and then the bus.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::core::context::Job;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::facade::FailureHook;

/// Runs `job`, routing a panic to `hook` and `bus`. Returns `true` if it completed.
pub fn run_guarded(job: Job, hook: &dyn FailureHook, bus: &Bus) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(()) => true,
        Err(payload) => {
            report(
                &TaskError::Panicked {
                    message: panic_message(payload.as_ref()),
                },
                hook,
                bus,
            );
            false
        }
    }
}

/// Wraps `job` so it runs guarded wherever the host decides to run it.
pub fn guard(job: Job, hook: Arc<dyn FailureHook>, bus: Bus) -> Job {
    Box::new(move || {
        run_guarded(job, hook.as_ref(), &bus);
    })
}

/// Reports an uncaught task failure.
pub fn report(err: &TaskError, hook: &dyn FailureHook, bus: &Bus) {
    hook.on_failure(err);
    bus.publish(Event::new(EventKind::TaskFailed).with_reason(err.to_string()));
}

/// Renders a panic payload as text.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn explode() {
        panic!("mailbox exploded");
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<TaskError>>);

    impl FailureHook for Collect {
        fn on_failure(&self, err: &TaskError) {
            self.0.lock().push(err.clone());
        }
    }

    #[test]
    fn completed_job_reports_nothing() {
        let hook = Collect::default();
        let bus = Bus::new(4);
        let mut rx = bus.subscribe();

        assert!(run_guarded(Box::new(|| {}), &hook, &bus));
        assert!(hook.0.lock().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn panic_is_caught_and_reported_once() {
        let hook = Arc::new(Collect::default());
        let bus = Bus::new(4);
        let mut rx = bus.subscribe();

        let job = guard(Box::new(explode), hook.clone(), bus);
        job();

        assert_eq!(
            *hook.0.lock(),
            vec![TaskError::Panicked {
                message: "mailbox exploded".into()
            }]
        );
        let ev = rx.try_recv().expect("failure event");
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn formatted_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new(format!("code {}", 7));
        assert_eq!(panic_message(payload.as_ref()), "code 7");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
