//! Context events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: both backends (admission, shutdown), `core::runner` (failed
//!   bodies), `Awaitable` (probe outcome), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Platform::attach` (fans out to `SubscriberSet`) and any
//!   caller of [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
