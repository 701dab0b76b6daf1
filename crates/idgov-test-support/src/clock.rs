//! Test clock: deterministic `Clock` implementation for tests.

use chrono::{DateTime, TimeZone, Utc};
use idgov_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(fixed_now())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The timestamp used across tests: 2026-01-15 10:00:00 UTC.
///
/// # Panics
///
/// Never; the literal date is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}
