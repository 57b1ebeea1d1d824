//! Alpha Vantage HTTP client.
//!
//! Serves two endpoints:
//! - Daily bars via `TIME_SERIES_DAILY` (compact output, last 100 days)
//! - Real-time quote via `GLOBAL_QUOTE`
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};

use super::{FetchMode, MarketDataSource};
use crate::errors::MarketDataError;
use crate::models::Symbol;

pub const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Alpha Vantage connection settings.
#[derive(Clone, Debug)]
pub struct AlphaVantageConfig {
    pub api_key: String,
    /// Query endpoint; overridable so tests can target a local server.
    pub base_url: String,
    /// Upper bound for a whole request, connection included.
    pub timeout: Duration,
}

impl AlphaVantageConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            api_key: "demo".to_string(),
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Alpha Vantage market data client.
pub struct AlphaVantageClient {
    client: Client,
    config: AlphaVantageConfig,
}

impl AlphaVantageClient {
    pub fn new(config: AlphaVantageConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    /// Query parameters for a request, API key last.
    fn query_params<'a>(&'a self, mode: FetchMode, symbol: &'a Symbol) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("function", mode.function()), ("symbol", symbol.as_str())];
        if mode == FetchMode::DailySeries {
            // 'full' is premium-only for TIME_SERIES_DAILY
            params.push(("outputsize", "compact"));
        }
        params.push(("apikey", self.config.api_key.as_str()));
        params
    }

    /// The URL with the `apikey` value replaced, for logging.
    fn masked(url: &Url) -> String {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == "apikey" { "***".into() } else { v.into_owned() };
                (k.into_owned(), v)
            })
            .collect();
        let mut masked = url.clone();
        masked.query_pairs_mut().clear().extend_pairs(pairs);
        masked.to_string()
    }

    fn build_url(&self, mode: FetchMode, symbol: &Symbol) -> Result<Url, MarketDataError> {
        Url::parse_with_params(&self.config.base_url, self.query_params(mode, symbol)).map_err(
            |e| MarketDataError::TransportError {
                status: None,
                message: format!("Failed to build URL: {}", e),
            },
        )
    }

    /// Execute one request and return the raw body of a successful response.
    async fn fetch(&self, mode: FetchMode, symbol: &Symbol) -> Result<String, MarketDataError> {
        let url = self.build_url(mode, symbol)?;

        debug!("Alpha Vantage request: {}", Self::masked(&url));

        let response = self.client.get(url).send().await.map_err(|e| {
            let status = e.status().map(|s| s.as_u16());
            // Drop the URL so the key never reaches error text.
            let message = if e.is_timeout() {
                format!("{} request timed out", PROVIDER_ID)
            } else {
                e.without_url().to_string()
            };
            MarketDataError::TransportError { status, message }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::TransportError {
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::TransportError {
                status: Some(status.as_u16()),
                message: e.to_string(),
            })?;

        debug!(
            "Alpha Vantage: {} returned {} bytes for {}",
            mode.function(),
            body.len(),
            symbol
        );

        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for AlphaVantageClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_series(&self, symbol: &Symbol) -> Result<String, MarketDataError> {
        self.fetch(FetchMode::DailySeries, symbol).await
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<String, MarketDataError> {
        self.fetch(FetchMode::GlobalQuote, symbol).await
    }
}
