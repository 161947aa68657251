//! Scheduling backends.
//!
//! - [`CooperativeContext`] one logical control flow over a [`Host`](crate::Host)
//! - [`ThreadedContext`] tokio worker threads with a task tracker

mod cooperative;
mod threaded;

pub use cooperative::CooperativeContext;
pub use threaded::ThreadedContext;
