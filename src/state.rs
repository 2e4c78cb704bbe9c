use crate::clock::Clock;
use crate::config::Config;
use crate::services::{rate_limit::RateLimiter, stats::Stats, storage::NoticeStore};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Everything a handler can touch. Built once and cloned into each request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: NoticeStore,
    pub limiter: Arc<Mutex<RateLimiter>>,
    pub stats: Stats,
    pub clock: Arc<dyn Clock>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(cfg: &Config, clock: Arc<dyn Clock>) -> Self {
        let stats = Stats::new();
        let store = NoticeStore::new(clock.clone(), stats.clone());
        // range checked in Config::validate
        let window = time::Duration::seconds(i64::try_from(cfg.rate_limit_window_secs).unwrap_or(i64::MAX));
        let limiter = RateLimiter::new(cfg.rate_limit_per_minute, window, clock.clone(), stats.clone());
        Self {
            store,
            limiter: Arc::new(Mutex::new(limiter)),
            stats,
            clock,
            started_at: Instant::now(),
        }
    }
}
