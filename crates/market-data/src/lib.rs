//! Stocktracker Market Data Crate
//!
//! Acquisition and normalization of daily OHLCV bars from Alpha Vantage.
//!
//! # Overview
//!
//! The crate provides:
//! - A sliding window rate limiter (5 calls per 60 seconds by default)
//! - An HTTP client for the `TIME_SERIES_DAILY` and `GLOBAL_QUOTE` endpoints
//! - Parsers that classify provider errors and normalize payloads into bars
//! - A synthetic series generator for presentation continuity
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   RateLimiter    |  (admission, one slot per network call)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | MarketDataSource |  (AlphaVantageClient: raw body or TransportError)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |     parser       |  (provider errors, series location, normalization)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    MarketBar     |  (validated, most recent first, <= 30)
//! +------------------+
//! ```
//!
//! Orchestration (ordering, persistence, fallback policy) lives in
//! `stocktracker-core`.

pub mod errors;
pub mod models;
pub mod parser;
pub mod provider;
pub mod rate_limiter;
pub mod synthetic;
pub mod validator;

pub use errors::{ErrorCategory, MarketDataError};
pub use models::{MarketBar, Symbol, SymbolError};
pub use parser::{parse_daily_series, parse_global_quote, parse_quote_payload};
pub use provider::alpha_vantage::{AlphaVantageClient, AlphaVantageConfig};
pub use provider::{FetchMode, MarketDataSource};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use synthetic::{SyntheticGenerator, SYNTHETIC_BARS};
pub use validator::BarValidator;
