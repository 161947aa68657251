//! # Shutdown requests for `wait_for_exit`.
//!
//! [`wait_for_exit`](crate::PlatformContext::wait_for_exit) polls a
//! [`ShutdownRequest`]. This module builds the common ones.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;

use crate::core::context::ShutdownRequest;
use crate::error::RuntimeError;

/// Builds a request that turns `true` once `flag` is set.
pub fn flag_request(flag: Arc<AtomicBool>) -> ShutdownRequest {
    Box::new(move || flag.load(Ordering::Acquire))
}

/// Builds a request that turns `true` once a termination signal arrives.
///
/// Listeners are registered immediately; the returned request stays `true`
/// after the first signal.
///
/// # Errors
/// [`RuntimeError::NoRuntime`] outside a tokio runtime, [`RuntimeError::Signal`]
/// if a listener cannot be registered.
#[cfg(unix)]
pub fn signal_request() -> Result<ShutdownRequest, RuntimeError> {
    use tokio::signal::unix::{SignalKind, signal};

    let handle = Handle::try_current().map_err(|e| RuntimeError::NoRuntime {
        reason: e.to_string(),
    })?;
    let register = |kind: SignalKind| {
        signal(kind).map_err(|e| RuntimeError::Signal {
            reason: e.to_string(),
        })
    };
    let mut sigint = register(SignalKind::interrupt())?;
    let mut sigterm = register(SignalKind::terminate())?;
    let mut sigquit = register(SignalKind::quit())?;

    let flag = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&flag);
    handle.spawn(async move {
        tokio::select! {
            _ = sigint.recv()  => {},
            _ = sigterm.recv() => {},
            _ = sigquit.recv() => {},
        }
        seen.store(true, Ordering::Release);
    });
    Ok(flag_request(flag))
}

/// Builds a request that turns `true` once Ctrl-C arrives.
///
/// # Errors
/// [`RuntimeError::NoRuntime`] outside a tokio runtime.
#[cfg(not(unix))]
pub fn signal_request() -> Result<ShutdownRequest, RuntimeError> {
    let handle = Handle::try_current().map_err(|e| RuntimeError::NoRuntime {
        reason: e.to_string(),
    })?;
    let flag = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&flag);
    handle.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            seen.store(true, Ordering::Release);
        }
    });
    Ok(flag_request(flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_request_follows_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut request = flag_request(Arc::clone(&flag));
        assert!(!request());
        flag.store(true, Ordering::Release);
        assert!(request());
    }

    #[test]
    fn signal_request_needs_runtime() {
        let err = signal_request().err().expect("no runtime");
        assert_eq!(err.as_label(), "runtime_no_runtime");
    }

    #[tokio::test]
    async fn signal_request_starts_false() {
        let mut request = signal_request().expect("listeners");
        assert!(!request());
    }
}
