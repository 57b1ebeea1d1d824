use std::sync::Arc;

use crate::config::Config;
use stocktracker_core::market_data::{FallbackPolicy, MarketDataService, MarketDataServiceTrait};
use stocktracker_market_data::{
    AlphaVantageClient, AlphaVantageConfig, MarketDataSource, RateLimitConfig, RateLimiter,
};
use stocktracker_storage_sqlite::{db, market_data::BarRepository};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub market_data_service: Arc<dyn MarketDataServiceTrait + Send + Sync>,
}

pub fn init_tracing() {
    let log_format = std::env::var("ST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());
    let bar_repository = Arc::new(BarRepository::new(pool.clone(), writer));

    let limiter = Arc::new(RateLimiter::with_config(RateLimitConfig {
        max_calls: config.rate_limit_max_calls,
        window: config.rate_limit_window,
    }));

    let provider_config = AlphaVantageConfig {
        api_key: config.alpha_vantage_api_key.clone(),
        base_url: config.alpha_vantage_base_url.clone(),
        timeout: config.request_timeout,
    };
    let source: Arc<dyn MarketDataSource> = Arc::new(AlphaVantageClient::new(provider_config));

    let fallback = if config.synthetic_fallback {
        FallbackPolicy::Synthetic
    } else {
        FallbackPolicy::Disabled
    };
    tracing::info!(
        "Market data: {} calls per {:?}, synthetic fallback {:?}",
        config.rate_limit_max_calls,
        config.rate_limit_window,
        fallback
    );

    let market_data_service: Arc<dyn MarketDataServiceTrait + Send + Sync> = Arc::new(
        MarketDataService::new(limiter, source, bar_repository).with_fallback(fallback),
    );

    Ok(Arc::new(AppState {
        market_data_service,
    }))
}
