//! # Event subscribers.
//!
//! ```text
//! Context ── publish(Event) ──► Bus ──► Platform::attach listener ──► SubscriberSet
//!                                                                  ┌──────┼──────┐
//!                                                                  ▼      ▼      ▼
//!                                                            LogWriter Metrics Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
