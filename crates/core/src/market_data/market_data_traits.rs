use async_trait::async_trait;

use stocktracker_market_data::{MarketBar, Symbol};

use super::market_data_model::{BarsResponse, QuoteResponse, RateLimitStatus};
use crate::errors::Result;

/// Storage interface for normalized bars.
///
/// Implementations write one bar per call. The service invokes `store` once
/// per bar and keeps going when a write fails.
#[async_trait]
pub trait BarStore: Send + Sync {
    /// Persist a single bar for `symbol`.
    async fn store(&self, symbol: &Symbol, bar: &MarketBar) -> Result<()>;

    /// Read up to `limit` stored bars for `symbol`, most recent first.
    async fn history(&self, symbol: &Symbol, limit: usize) -> Result<Vec<MarketBar>>;
}

#[async_trait]
pub trait MarketDataServiceTrait: Send + Sync {
    /// Validate `symbol`, then run the daily series pipeline.
    async fn get_daily_bars(&self, symbol: &str) -> Result<BarsResponse>;

    /// Validate `symbol`, then fetch and persist the latest quote.
    async fn get_quote(&self, symbol: &str) -> Result<QuoteResponse>;

    /// Read previously persisted bars.
    async fn get_stored_bars(&self, symbol: &str, limit: usize) -> Result<Vec<MarketBar>>;

    /// Most recently loaded symbols, most recent first.
    fn recent_symbols(&self) -> Vec<Symbol>;

    /// Snapshot of the local call budget.
    fn rate_limit_status(&self) -> RateLimitStatus;
}
