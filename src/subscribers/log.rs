//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [dropped] delay=Some(5)
//! [failed] reason="task panicked: boom"
//! [timer-canceled]
//! [probe-ready] attempt=3
//! [probe-canceled] attempt=1
//! [shutdown-requested] force=false
//! [terminated]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use; implement
/// a custom [`Subscribe`] for structured logging or metrics.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Renders one event as a log line.
    pub fn render(e: &Event) -> String {
        match e.kind {
            EventKind::TaskDropped => format!("[dropped] delay={:?}", e.delay_ms),
            EventKind::TaskFailed => format!("[failed] reason={:?}", e.reason),
            EventKind::TimerCanceled => "[timer-canceled]".to_string(),
            EventKind::ProbeReady => format!("[probe-ready] attempt={:?}", e.attempt),
            EventKind::ProbeCanceled => format!("[probe-canceled] attempt={:?}", e.attempt),
            EventKind::ShutdownRequested => {
                format!("[shutdown-requested] force={}", e.force.unwrap_or(false))
            }
            EventKind::Terminated => "[terminated]".to_string(),
            EventKind::SubscriberOverflow => format!("[subscriber-overflow] {:?}", e.reason),
            EventKind::SubscriberPanicked => format!("[subscriber-panicked] {:?}", e.reason),
        }
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", Self::render(e));
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
