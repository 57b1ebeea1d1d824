use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

/// Server settings read from `ST_*` environment variables (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    /// Bounds each provider call. The HTTP layer adds a grace period on top.
    pub request_timeout: Duration,
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_base_url: String,
    pub rate_limit_max_calls: usize,
    pub rate_limit_window: Duration,
    pub synthetic_fallback: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("ST_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid ST_LISTEN_ADDR")?;
        let db_path = env_or("ST_DB_PATH", "./db/stocks.db");
        let cors_allow = env_or("ST_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = env_or("ST_REQUEST_TIMEOUT_MS", "30000")
            .parse()
            .context("Invalid ST_REQUEST_TIMEOUT_MS")?;
        let alpha_vantage_api_key = env_or("ST_ALPHA_VANTAGE_API_KEY", "demo");
        let alpha_vantage_base_url = env_or(
            "ST_ALPHA_VANTAGE_BASE_URL",
            stocktracker_market_data::provider::alpha_vantage::BASE_URL,
        );
        let rate_limit_max_calls: usize = env_or("ST_RATE_LIMIT_MAX_CALLS", "5")
            .parse()
            .context("Invalid ST_RATE_LIMIT_MAX_CALLS")?;
        let window_secs: u64 = env_or("ST_RATE_LIMIT_WINDOW_SECS", "60")
            .parse()
            .context("Invalid ST_RATE_LIMIT_WINDOW_SECS")?;
        let synthetic_fallback = parse_bool(&env_or("ST_SYNTHETIC_FALLBACK", "true"))
            .context("Invalid ST_SYNTHETIC_FALLBACK")?;

        if rate_limit_max_calls == 0 {
            anyhow::bail!("ST_RATE_LIMIT_MAX_CALLS must be at least 1");
        }
        if window_secs == 0 {
            anyhow::bail!("ST_RATE_LIMIT_WINDOW_SECS must be at least 1");
        }

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            alpha_vantage_api_key,
            alpha_vantage_base_url,
            rate_limit_max_calls,
            rate_limit_window: Duration::from_secs(window_secs),
            synthetic_fallback,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}
