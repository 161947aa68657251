//! Host environments for the cooperative backend.
//!
//! ## Contents
//! - [`Host`] the consumed "run now / run after / clear" capability
//! - [`TokioHost`] a tokio runtime used as the event loop
//! - [`ManualHost`] a virtual-clock loop driven by [`ManualHost::advance`]

mod host;
mod manual;
mod tokio_host;

pub use host::Host;
pub use manual::{ManualHost, TimerId};
pub use tokio_host::TokioHost;
