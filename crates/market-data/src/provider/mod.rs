//! Market data provider abstraction and the Alpha Vantage client.
//!
//! A provider only moves bytes: it builds the request for a symbol and mode,
//! executes it, and hands back the raw success body. Interpreting the payload
//! is the parser's job.
//!
//! Callers must hold a rate limiter admission for every call they make; the
//! provider itself never re-checks it.

pub mod alpha_vantage;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::Symbol;

/// The endpoint family a request targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FetchMode {
    /// Daily OHLCV series (`TIME_SERIES_DAILY`).
    DailySeries,
    /// Single real-time quote (`GLOBAL_QUOTE`).
    GlobalQuote,
}

impl FetchMode {
    /// Value of the `function` query parameter.
    pub fn function(&self) -> &'static str {
        match self {
            Self::DailySeries => "TIME_SERIES_DAILY",
            Self::GlobalQuote => "GLOBAL_QUOTE",
        }
    }
}

/// Source of raw market data payloads.
///
/// Implemented by [`alpha_vantage::AlphaVantageClient`] in production and by
/// scripted sources in tests.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Identifier used in logs, e.g. "ALPHA_VANTAGE".
    fn id(&self) -> &'static str;

    /// Fetch the raw daily series body for `symbol`.
    async fn fetch_series(&self, symbol: &Symbol) -> Result<String, MarketDataError>;

    /// Fetch the raw quote body for `symbol`.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<String, MarketDataError>;
}
