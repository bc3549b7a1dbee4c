//! Clock abstraction so token expiry can be tested without sleeping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of the current instant.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Instant;
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Real monotonic time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests.
///
/// Clones share the same current instant.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a clock frozen at `Instant::now()`.
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_is_frozen_until_advanced() {
        let clock = MockClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(39));
        assert_eq!(clock.now() - start, Duration::from_secs(39));
    }

    #[test]
    fn test_mock_clock_clones_share_time() {
        let clock = MockClock::new();
        let other = clock.clone();
        let start = other.now();

        clock.advance(Duration::from_secs(5));
        assert_eq!(other.now() - start, Duration::from_secs(5));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
