//! # Uncaught-failure reporting.
//!
//! Work submitted through `execute`/`schedule`/`delayed` has no result channel. When
//! such a body panics (or a `delayed` body returns `Err`), the context hands the
//! error to its [`FailureHook`]. The default, [`PrintFailure`], writes one line to
//! stderr; the context keeps running either way.
//!
//! Any `Fn(&TaskError) + Send + Sync` closure is a hook as well:
//! ```rust
//! use std::sync::Arc;
//! use platctx::{FailureHook, TaskError};
//!
//! let hook: Arc<dyn FailureHook> = Arc::new(|err: &TaskError| {
//!     eprintln!("actor crashed: {}", err.as_label());
//! });
//! hook.on_failure(&TaskError::fail("boom"));
//! ```

use std::sync::Arc;

use crate::error::TaskError;

/// Receives failures of work that has no result channel of its own.
pub trait FailureHook: Send + Sync + 'static {
    /// Called once per failed body, on the flow that ran it.
    fn on_failure(&self, err: &TaskError);
}

/// Shared hook handle.
pub type HookRef = Arc<dyn FailureHook>;

/// Default hook: prints the failure to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintFailure;

impl FailureHook for PrintFailure {
    fn on_failure(&self, err: &TaskError) {
        eprintln!("[platctx] uncaught task failure: {err}");
    }
}

impl<F> FailureHook for F
where
    F: Fn(&TaskError) + Send + Sync + 'static,
{
    fn on_failure(&self, err: &TaskError) {
        self(err)
    }
}

/// Returns the default hook.
pub fn default_hook() -> HookRef {
    Arc::new(PrintFailure)
}
