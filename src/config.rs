use anyhow::{bail, Context};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_limit")]
    pub rate_limit_per_minute: usize,
    #[serde(default = "default_window")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_cleanup")]
    pub cleanup_interval_secs: u64,
}
fn default_port() -> u16 { 8080 }
fn default_limit() -> usize { 10 }
fn default_window() -> u64 { 60 }
fn default_cleanup() -> u64 { 60 }

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            rate_limit_per_minute: default_limit(),
            rate_limit_window_secs: default_window(),
            cleanup_interval_secs: default_cleanup(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let cfg = Self {
            port: env_or("PORT", default_port())?,
            rate_limit_per_minute: env_or("RATE_LIMIT_PER_MINUTE", default_limit())?,
            rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW_SECS", default_window())?,
            cleanup_interval_secs: env_or("CLEANUP_INTERVAL_SECS", default_cleanup())?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rate_limit_per_minute == 0 {
            bail!("RATE_LIMIT_PER_MINUTE must be at least 1");
        }
        if self.rate_limit_window_secs == 0 || i64::try_from(self.rate_limit_window_secs).is_err() {
            bail!("RATE_LIMIT_WINDOW_SECS must be between 1 and {}", i64::MAX);
        }
        if self.cleanup_interval_secs == 0 {
            bail!("CLEANUP_INTERVAL_SECS must be at least 1");
        }
        Ok(())
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.trim().parse().with_context(|| format!("invalid {key}: {v:?}")),
        Err(_) => Ok(default),
    }
}
