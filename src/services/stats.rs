//! Process-wide counters.
//!
//! Counters only ever grow; `last_cleanup` is the one field that moves
//! (forward) on each reclamation pass that removed something.

use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;

/// Sentinel for "no cleanup has removed anything yet".
const NEVER: i64 = i64::MIN;

#[derive(Debug, Clone)]
pub struct Stats {
    inner: Arc<StatsInner>,
}

#[derive(Debug)]
struct StatsInner {
    total_notices_created: AtomicU64,
    total_requests: AtomicU64,
    auto_cleanups: AtomicU64,
    rate_limited_requests: AtomicU64,
    /// Unix timestamp in milliseconds, or [`NEVER`].
    last_cleanup_ms: AtomicI64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatsInner {
                total_notices_created: AtomicU64::new(0),
                total_requests: AtomicU64::new(0),
                auto_cleanups: AtomicU64::new(0),
                rate_limited_requests: AtomicU64::new(0),
                last_cleanup_ms: AtomicI64::new(NEVER),
            }),
        }
    }

    pub(crate) fn record_created(&self, count: u64) {
        self.inner.total_notices_created.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_request(&self) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rate_limited(&self) {
        self.inner.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cleanup(&self, at: OffsetDateTime) {
        self.inner.auto_cleanups.fetch_add(1, Ordering::Relaxed);
        let ms = (at.unix_timestamp_nanos() / 1_000_000) as i64;
        self.inner.last_cleanup_ms.fetch_max(ms, Ordering::Relaxed);
    }

    pub fn total_notices_created(&self) -> u64 {
        self.inner.total_notices_created.load(Ordering::Relaxed)
    }

    pub fn total_requests(&self) -> u64 {
        self.inner.total_requests.load(Ordering::Relaxed)
    }

    pub fn auto_cleanups(&self) -> u64 {
        self.inner.auto_cleanups.load(Ordering::Relaxed)
    }

    pub fn rate_limited_requests(&self) -> u64 {
        self.inner.rate_limited_requests.load(Ordering::Relaxed)
    }

    pub fn last_cleanup(&self) -> Option<OffsetDateTime> {
        match self.inner.last_cleanup_ms.load(Ordering::Relaxed) {
            NEVER => None,
            ms => OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000).ok(),
        }
    }

    /// Snapshot of the counters. `active_notices` is supplied by the caller,
    /// which reads it from the store in the same critical section.
    pub fn snapshot(&self, active_notices: usize) -> StatsSnapshot {
        StatsSnapshot {
            total_notices_created: self.total_notices_created(),
            total_requests: self.total_requests(),
            auto_cleanups: self.auto_cleanups(),
            last_cleanup: self.last_cleanup(),
            rate_limited_requests: self.rate_limited_requests(),
            active_notices,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_notices_created: u64,
    pub total_requests: u64,
    pub auto_cleanups: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_cleanup: Option<OffsetDateTime>,
    pub rate_limited_requests: u64,
    pub active_notices: usize,
}
