//! # Context configuration.
//!
//! Provides [`ContextConfig`], the settings fixed at construction time of a
//! scheduling context.
//!
//! ## Sentinel values
//! - `load = 0` → unlimited (no concurrency semaphore on threaded hosts)
//! - `pause = 0s` → clamped to [`MIN_PAUSE`] so polling always makes progress

use std::time::Duration;

/// Smallest polling cadence a context will use.
pub const MIN_PAUSE: Duration = Duration::from_millis(1);

/// Configuration of a scheduling context.
///
/// ## Field semantics
/// - `pause`: natural polling interval used by `await` and as the default
///   `wait_for_exit` cadence
/// - `load`: advisory concurrency factor; the threaded backend runs at most
///   `load` task bodies at once (`0` = unlimited), the cooperative backend
///   only reports it
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct ContextConfig {
    /// Natural polling interval.
    pub pause: Duration,

    /// Advisory concurrency factor.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = at most `n` bodies run simultaneously (threaded hosts only)
    pub load: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl ContextConfig {
    /// Returns a config with the given pause and defaults for everything else.
    pub fn with_pause(pause: Duration) -> Self {
        Self {
            pause,
            ..Self::default()
        }
    }

    /// Returns the polling interval, clamped to at least [`MIN_PAUSE`].
    #[inline]
    pub fn pause_clamped(&self) -> Duration {
        self.pause.max(MIN_PAUSE)
    }

    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent bodies
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.load == 0 { None } else { Some(self.load) }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ContextConfig {
    /// Default configuration:
    ///
    /// - `pause = 10ms`
    /// - `load = 4`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            pause: Duration::from_millis(10),
            load: 4,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ContextConfig::default();
        assert_eq!(cfg.pause_clamped(), Duration::from_millis(10));
        assert_eq!(cfg.concurrency_limit(), Some(4));
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
    }

    #[test]
    fn sentinels() {
        let cfg = ContextConfig {
            pause: Duration::ZERO,
            load: 0,
            bus_capacity: 0,
        };
        assert_eq!(cfg.pause_clamped(), MIN_PAUSE);
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
