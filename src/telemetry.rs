use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,notice_board=info,tower_http=info";

/// Installs the global subscriber. If one is already installed (tests that
/// build the app more than once) the existing one is kept.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .try_init()
    {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_twice_keeps_first_subscriber() {
        super::init();
        super::init();
        tracing::info!("still logging");
    }
}
