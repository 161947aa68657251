//! Actor-facing helpers composed on top of [`PlatformContext`](crate::PlatformContext).
//!
//! ## Contents
//! - [`Platform`] the handle actors hold: `future`, `delayed`, `await_result`
//! - [`Promise`] single-assignment result cell returned by `future`
//! - [`FailureHook`] where failures of result-less work end up

mod failure;
mod platform;
mod promise;

pub use failure::{FailureHook, HookRef, PrintFailure, default_hook};
pub use platform::Platform;
pub use promise::Promise;
