//! # Single-assignment result cell.
//!
//! [`Promise`] is what [`Platform::future`](crate::Platform::future) returns. It is
//! written at most once by the submitted task and can be observed two ways:
//! - `.await` it from async code;
//! - [`Promise::try_take`] it from a cooperative flow that cannot block.
//!
//! If the task never runs, the [`Resolver`] settles the promise when it is dropped:
//! - [`TaskError::Dropped`] when the context refused the task (already shut down);
//! - [`TaskError::Canceled`] when the task was admitted and later discarded
//!   (forced shutdown, host teardown).
//!
//! The result is handed out once. Observing a promise again after that yields
//! [`TaskError::Dropped`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::TaskError;

/// Write side of a [`Promise`], consumed by the task wrapper.
pub(crate) struct Resolver<T> {
    tx: Option<oneshot::Sender<Result<T, TaskError>>>,
    admitted: Arc<AtomicBool>,
}

impl<T> Resolver<T> {
    /// Flag the submitter sets once the context accepted the task.
    pub(crate) fn admission(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.admitted)
    }

    pub(crate) fn resolve(mut self, res: Result<T, TaskError>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(res);
        }
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let err = if self.admitted.load(Ordering::Acquire) {
            TaskError::Canceled
        } else {
            TaskError::Dropped
        };
        let _ = tx.send(Err(err));
    }
}

/// Eventual result of a submitted task.
#[must_use = "a promise does nothing unless observed"]
#[derive(Debug)]
pub struct Promise<T> {
    rx: oneshot::Receiver<Result<T, TaskError>>,
    taken: bool,
}

impl<T> Promise<T> {
    pub(crate) fn channel() -> (Resolver<T>, Self) {
        let (tx, rx) = oneshot::channel();
        let resolver = Resolver {
            tx: Some(tx),
            admitted: Arc::new(AtomicBool::new(false)),
        };
        (resolver, Self { rx, taken: false })
    }

    /// Takes the result if it is available.
    ///
    /// Returns `None` while the task is still pending and after the result was
    /// taken once.
    pub fn try_take(&mut self) -> Option<Result<T, TaskError>> {
        if self.taken {
            return None;
        }
        let res = match self.rx.try_recv() {
            Ok(res) => res,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(TaskError::Dropped),
        };
        self.taken = true;
        Some(res)
    }
}

impl<T> Future for Promise<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.taken {
            return Poll::Ready(Err(TaskError::Dropped));
        }
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(res) => {
                self.taken = true;
                Poll::Ready(res.unwrap_or(Err(TaskError::Dropped)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn pending_then_resolved_once() {
        let (tx, mut promise) = Promise::<u32>::channel();
        assert!(promise.try_take().is_none());

        tx.resolve(Ok(7));
        assert_eq!(promise.try_take(), Some(Ok(7)));
        assert!(promise.try_take().is_none());
    }

    #[test]
    fn awaiting_after_take_does_not_repoll() {
        let (tx, mut promise) = Promise::<u32>::channel();
        tx.resolve(Ok(7));
        assert_eq!(promise.try_take(), Some(Ok(7)));

        assert_eq!((&mut promise).now_or_never(), Some(Err(TaskError::Dropped)));
        assert!(promise.try_take().is_none());
    }

    #[test]
    fn refused_task_resolves_dropped() {
        let (tx, promise) = Promise::<u32>::channel();
        drop(tx);
        assert_eq!(promise.now_or_never(), Some(Err(TaskError::Dropped)));
    }

    #[test]
    fn discarded_after_admission_resolves_canceled() {
        let (tx, mut promise) = Promise::<u32>::channel();
        tx.admission().store(true, Ordering::Release);
        drop(tx);
        assert_eq!(promise.try_take(), Some(Err(TaskError::Canceled)));
    }
}
