//! Error types used by the scheduling contexts and the work they run.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] — administrative failures raised at the call site (fail fast).
//! - [`TaskError`] — failures of individual units of work, isolated per task.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Admission after shutdown is **not** an error: `execute`/`schedule` on a closed
//! context silently drop the work.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the scheduling substrate itself.
///
/// Returned immediately from `schedule`/`await`/construction calls; they never
/// describe the outcome of a task body.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The host cannot represent a deadline that far in the future.
    #[error("delay {delay:?} cannot be represented by the host timer")]
    InvalidDelay {
        /// The rejected delay.
        delay: Duration,
    },

    /// The host has no free timer slot left.
    #[error("host timer capacity {capacity} exhausted")]
    TimerExhausted {
        /// Configured number of concurrently pending timers.
        capacity: usize,
    },

    /// A tokio-backed host or context was built outside of a tokio runtime.
    #[error("no tokio runtime available: {reason}")]
    NoRuntime {
        /// Underlying reason reported by tokio.
        reason: String,
    },

    /// OS signal listeners could not be registered.
    #[error("signal registration failed: {reason}")]
    Signal {
        /// Underlying I/O error message.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use platctx::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::InvalidDelay { delay: Duration::MAX };
    /// assert_eq!(err.as_label(), "runtime_invalid_delay");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidDelay { .. } => "runtime_invalid_delay",
            RuntimeError::TimerExhausted { .. } => "runtime_timer_exhausted",
            RuntimeError::NoRuntime { .. } => "runtime_no_runtime",
            RuntimeError::Signal { .. } => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidDelay { delay } => format!("invalid delay: {delay:?}"),
            RuntimeError::TimerExhausted { capacity } => {
                format!("timer capacity exhausted: {capacity}")
            }
            RuntimeError::NoRuntime { reason } => format!("no runtime: {reason}"),
            RuntimeError::Signal { reason } => format!("signal: {reason}"),
        }
    }
}

/// # Errors produced by a unit of work.
///
/// Captured per task and surfaced through its result channel
/// ([`Promise`](crate::Promise)) or, for fire-and-forget work, routed to the
/// [`FailureHook`](crate::FailureHook). They never escape to unrelated tasks.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task body reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task body panicked; the panic was caught by the scheduler.
    #[error("task panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Task was never run because the context stopped admitting work.
    #[error("task dropped: context is shut down")]
    Dropped,

    /// Task was admitted but discarded before it ran (forced shutdown, host teardown).
    #[error("task cancelled before it ran")]
    Canceled,
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use platctx::TaskError;
    ///
    /// assert_eq!(TaskError::Dropped.as_label(), "task_dropped");
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Dropped => "task_dropped",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { message } => format!("panic: {message}"),
            TaskError::Dropped => "dropped after shutdown".to_string(),
            TaskError::Canceled => "cancelled before running".to_string(),
        }
    }

    /// True when the work never ran because admission was closed.
    pub fn is_dropped(&self) -> bool {
        matches!(self, TaskError::Dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(
            RuntimeError::TimerExhausted { capacity: 3 }.as_label(),
            "runtime_timer_exhausted"
        );
        assert_eq!(
            TaskError::Panicked {
                message: "x".into()
            }
            .as_label(),
            "task_panicked"
        );
    }

    #[test]
    fn display_includes_details() {
        let err = TaskError::fail("disk full");
        assert_eq!(err.to_string(), "execution failed: disk full");
        assert_eq!(err.as_message(), "error: disk full");
        assert!(!err.is_dropped());
        assert!(TaskError::Dropped.is_dropped());
    }
}
