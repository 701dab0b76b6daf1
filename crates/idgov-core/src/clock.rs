//! Clock abstraction for event timestamps.

use chrono::{DateTime, Utc};

/// Source of `created_at`/`updated_at` timestamps, injectable for tests.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
