use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use stocktracker_market_data::{
    parse_daily_series, parse_quote_payload, MarketBar, MarketDataError, MarketDataSource,
    RateLimiter, Symbol, SyntheticGenerator,
};

use super::market_data_constants::MAX_STORED_BARS_LIMIT;
use super::market_data_model::{BarsResponse, FetchOutcome, QuoteResponse, RateLimitStatus};
use super::market_data_traits::{BarStore, MarketDataServiceTrait};
use super::symbol_history::SymbolHistory;
use crate::errors::Result;

/// What to deliver when live retrieval fails for an unexpected reason.
///
/// Quota and rejection errors always reach the caller; this only governs
/// transport, payload, and parse failures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Serve a synthetic series in place of the error.
    #[default]
    Synthetic,
    /// Surface every error as-is.
    Disabled,
}

/// Orchestrates one acquisition: symbol check, admission, fetch, parse,
/// persistence, and the fallback decision.
pub struct MarketDataService {
    limiter: Arc<RateLimiter>,
    source: Arc<dyn MarketDataSource>,
    store: Arc<dyn BarStore>,
    generator: SyntheticGenerator,
    fallback: FallbackPolicy,
    history: SymbolHistory,
}

impl MarketDataService {
    pub fn new(
        limiter: Arc<RateLimiter>,
        source: Arc<dyn MarketDataSource>,
        store: Arc<dyn BarStore>,
    ) -> Self {
        Self {
            limiter,
            source,
            store,
            generator: SyntheticGenerator::new(),
            fallback: FallbackPolicy::default(),
            history: SymbolHistory::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_generator(mut self, generator: SyntheticGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Take one slot from the limiter or fail without touching the network.
    fn admit(&self, symbol: &Symbol) -> Result<()> {
        if self.limiter.admit() {
            return Ok(());
        }
        let retry_after = self.limiter.retry_after();
        info!(
            "Request for {} rejected by local rate limiter, retry in {:?}",
            symbol, retry_after
        );
        Err(MarketDataError::LocalRateLimitExceeded { retry_after }.into())
    }

    async fn fetch_live_series(
        &self,
        symbol: &Symbol,
    ) -> std::result::Result<Vec<MarketBar>, MarketDataError> {
        let body = self.source.fetch_series(symbol).await?;
        parse_daily_series(symbol, &body)
    }

    async fn fetch_live_quote(
        &self,
        symbol: &Symbol,
    ) -> std::result::Result<MarketBar, MarketDataError> {
        let body = self.source.fetch_quote(symbol).await?;
        parse_quote_payload(symbol, &body)
    }

    /// Write each bar independently. Failures are collected, not raised.
    async fn persist(&self, symbol: &Symbol, bars: &[MarketBar]) -> Vec<String> {
        let mut failures = Vec::new();
        for bar in bars {
            if let Err(e) = self.store.store(symbol, bar).await {
                let error = MarketDataError::PersistenceError(format!(
                    "{} {}: {}",
                    symbol,
                    bar.timestamp.format("%Y-%m-%d"),
                    e
                ));
                warn!("{}", error);
                failures.push(error.to_string());
            }
        }
        if failures.is_empty() {
            debug!("Persisted {} bars for {}", bars.len(), symbol);
        }
        failures
    }

    /// Side effects of a failed live attempt on shared state.
    fn note_failure(&self, symbol: &Symbol, error: &MarketDataError) {
        match error {
            MarketDataError::UpstreamThrottled(_) => self.limiter.record_upstream_throttle(),
            MarketDataError::UpstreamRejected(_) | MarketDataError::NoTimeSeriesFound { .. } => {
                self.history.remove(symbol)
            }
            _ => {}
        }
    }
}

#[async_trait]
impl MarketDataServiceTrait for MarketDataService {
    async fn get_daily_bars(&self, symbol: &str) -> Result<BarsResponse> {
        let symbol = Symbol::parse(symbol)?;
        self.admit(&symbol)?;

        match self.fetch_live_series(&symbol).await {
            Ok(bars) => {
                let persistence_errors = self.persist(&symbol, &bars).await;
                self.history.record(&symbol);
                info!(
                    "Loaded {} bars for {} from {}",
                    bars.len(),
                    symbol,
                    self.source.id()
                );
                Ok(BarsResponse {
                    symbol,
                    bars,
                    outcome: FetchOutcome::Live,
                    persistence_errors,
                })
            }
            Err(e) => {
                self.note_failure(&symbol, &e);
                if self.fallback == FallbackPolicy::Synthetic && e.allows_synthetic_fallback() {
                    warn!(
                        "Live retrieval for {} failed ({}), serving synthetic bars",
                        symbol, e
                    );
                    Ok(BarsResponse {
                        bars: self.generator.generate(&symbol),
                        symbol,
                        outcome: FetchOutcome::Synthetic {
                            reason: e.to_string(),
                        },
                        persistence_errors: Vec::new(),
                    })
                } else {
                    warn!("Live retrieval for {} failed: {}", symbol, e);
                    Err(e.into())
                }
            }
        }
    }

    async fn get_quote(&self, symbol: &str) -> Result<QuoteResponse> {
        let symbol = Symbol::parse(symbol)?;
        self.admit(&symbol)?;

        let bar = self.fetch_live_quote(&symbol).await.map_err(|e| {
            self.note_failure(&symbol, &e);
            warn!("Quote retrieval for {} failed: {}", symbol, e);
            e
        })?;

        let persistence_errors = self.persist(&symbol, std::slice::from_ref(&bar)).await;
        Ok(QuoteResponse {
            symbol,
            bar,
            persistence_errors,
        })
    }

    async fn get_stored_bars(&self, symbol: &str, limit: usize) -> Result<Vec<MarketBar>> {
        let symbol = Symbol::parse(symbol)?;
        let limit = limit.clamp(1, MAX_STORED_BARS_LIMIT);
        self.store.history(&symbol, limit).await
    }

    fn recent_symbols(&self) -> Vec<Symbol> {
        self.history.symbols()
    }

    fn rate_limit_status(&self) -> RateLimitStatus {
        RateLimitStatus {
            limited: self.limiter.is_limited(),
            remaining: self.limiter.remaining(),
            retry_after_secs: self.limiter.retry_after().as_secs_f64().ceil() as u64,
        }
    }
}
