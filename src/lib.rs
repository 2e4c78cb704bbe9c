pub mod clock;
pub mod config;
pub mod telemetry;
pub mod state;
pub mod error;
pub mod domain { pub mod notice; }
pub mod services { pub mod housekeeping; pub mod rate_limit; pub mod stats; pub mod storage; }
pub mod web { pub mod client; pub mod handlers; pub mod router; }

use crate::clock::{Clock, SystemClock};
use crate::services::housekeeping::Janitor;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Builds the router on the system clock and starts the janitor. The
/// returned [`Janitor`] must be kept alive for cleanup to keep running.
pub fn build_app(cfg: crate::config::Config) -> (axum::Router, Janitor, u16) {
    build_app_with_clock(cfg, Arc::new(SystemClock))
}

pub fn build_app_with_clock(cfg: crate::config::Config, clock: Arc<dyn Clock>) -> (axum::Router, Janitor, u16) {
    let state = AppState::new(&cfg, clock);
    let janitor = Janitor::start(
        state.store.clone(),
        state.limiter.clone(),
        Duration::from_secs(cfg.cleanup_interval_secs),
    );
    (crate::web::router::build_router(state), janitor, cfg.port)
}
