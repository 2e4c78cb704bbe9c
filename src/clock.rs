//! Time source for expiry and rate-window arithmetic.
//!
//! Everything that compares against "now" goes through [`Clock`] so tests can
//! drive time explicitly with [`MockClock`].

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use time::{Duration, OffsetDateTime};

/// Port for obtaining the current wall-clock time.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> OffsetDateTime;
}

/// UTC system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Controllable clock for tests.
///
/// Clones share the same instant, so advancing one clone is visible through
/// every store or limiter holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<OffsetDateTime>>,
}

impl MockClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, by: Duration) {
        let mut t = self.current.lock().expect("MockClock mutex poisoned");
        *t += by;
    }

    pub fn set(&self, at: OffsetDateTime) {
        *self.current.lock().expect("MockClock mutex poisoned") = at;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }
}

impl Clock for MockClock {
    fn now(&self) -> OffsetDateTime {
        *self.current.lock().expect("MockClock mutex poisoned")
    }
}
