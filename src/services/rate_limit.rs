use crate::clock::Clock;
use crate::services::stats::Stats;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tracing::warn;

/// Sliding-window limiter keyed by client identity.
///
/// Keys are never evicted, only their timestamps are pruned, so the key set
/// grows with the number of distinct clients seen.
#[derive(Debug)]
pub struct RateLimiter {
    hits: HashMap<String, VecDeque<OffsetDateTime>>,
    limit: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    stats: Stats,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration, clock: Arc<dyn Clock>, stats: Stats) -> Self {
        Self { hits: HashMap::new(), limit, window, clock, stats }
    }

    /// Records the request and returns `true` when `client` is under its
    /// limit; rejected requests are not recorded.
    pub fn allow(&mut self, client: &str) -> bool {
        let now = self.clock.now();
        let window = self.window;
        let dq = self.hits.entry(client.to_string()).or_default();
        prune(dq, now, window);
        if dq.len() >= self.limit {
            self.stats.record_rate_limited();
            warn!(%client, limit = self.limit, "rate limit exceeded");
            return false;
        }
        dq.push_back(now);
        true
    }

    /// Prunes stale timestamps for every known client.
    pub fn sweep(&mut self) {
        let now = self.clock.now();
        for dq in self.hits.values_mut() {
            prune(dq, now, self.window);
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }
}

fn prune(dq: &mut VecDeque<OffsetDateTime>, now: OffsetDateTime, window: Duration) {
    while let Some(&t) = dq.front() {
        if now - t > window { dq.pop_front(); } else { break; }
    }
}
