//! # Tokio as a host event loop.
//!
//! [`TokioHost`] maps the host primitives onto a tokio runtime handle. On a
//! `current_thread` runtime this is a faithful single-flow event loop; on a
//! multi-thread runtime jobs may land on different workers but are still
//! submitted one callback at a time.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, sleep_until};

use crate::core::Job;
use crate::error::RuntimeError;
use crate::hosts::Host;

/// Host backed by a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioHost {
    handle: Handle,
}

impl TokioHost {
    /// Binds to the runtime of the calling thread.
    ///
    /// # Errors
    /// [`RuntimeError::NoRuntime`] outside a tokio runtime.
    pub fn current() -> Result<Self, RuntimeError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|e| RuntimeError::NoRuntime {
                reason: e.to_string(),
            })
    }

    /// Binds to an explicit runtime handle.
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Host for TokioHost {
    type Timer = AbortHandle;

    fn run_now(&self, job: Job) {
        self.handle.spawn(async move { job() });
    }

    fn run_after(&self, delay: Duration, job: Job) -> Result<AbortHandle, RuntimeError> {
        let deadline = Instant::now()
            .checked_add(delay)
            .ok_or(RuntimeError::InvalidDelay { delay })?;
        let task = self.handle.spawn(async move {
            sleep_until(deadline).await;
            job();
        });
        Ok(task.abort_handle())
    }

    fn clear(&self, timer: AbortHandle) {
        timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn current_needs_runtime() {
        let err = TokioHost::current().expect_err("no runtime");
        assert_eq!(err.as_label(), "runtime_no_runtime");
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_timer_never_runs() {
        let host = TokioHost::current().expect("runtime");
        let hits = Arc::new(AtomicUsize::new(0));

        let h1 = Arc::clone(&hits);
        let keep = host
            .run_after(Duration::from_millis(5), Box::new(move || {
                h1.fetch_add(1, Ordering::SeqCst);
            }))
            .expect("timer");
        let h2 = Arc::clone(&hits);
        let dropped = host
            .run_after(Duration::from_millis(5), Box::new(move || {
                h2.fetch_add(10, Ordering::SeqCst);
            }))
            .expect("timer");

        host.clear(dropped);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(keep.is_finished());
    }

    #[tokio::test]
    async fn unrepresentable_delay_fails_fast() {
        let host = TokioHost::current().expect("runtime");
        let err = host
            .run_after(Duration::MAX, Box::new(|| {}))
            .expect_err("invalid delay");
        assert_eq!(err.as_label(), "runtime_invalid_delay");
    }
}
