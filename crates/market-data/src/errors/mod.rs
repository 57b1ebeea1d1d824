//! Error types and outcome classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`ErrorCategory`]: The user-facing message category an error falls into

mod category;

pub use category::ErrorCategory;

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while acquiring and normalizing market data.
///
/// Each variant is classified into an [`ErrorCategory`] via
/// [`category`](Self::category), and answers whether a synthetic series may
/// stand in for it via [`allows_synthetic_fallback`](Self::allows_synthetic_fallback).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// The local call budget is spent. No network call was attempted.
    #[error("Local rate limit exceeded, retry in {}s", wait_secs(*retry_after))]
    LocalRateLimitExceeded {
        /// Time until the oldest call in the window ages out
        retry_after: Duration,
    },

    /// Non-success HTTP status or a connectivity failure.
    /// Not retried internally.
    #[error("Transport error: {message}")]
    TransportError {
        /// HTTP status, absent when the request never completed
        status: Option<u16>,
        /// Description of the failure
        message: String,
    },

    /// The body is not a JSON object.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The provider refused the call with its own rate-limit marker.
    #[error("Upstream rate limit: {0}")]
    UpstreamThrottled(String),

    /// The provider reported an error, typically an unknown symbol.
    #[error("Upstream rejected request: {0}")]
    UpstreamRejected(String),

    /// A quote came back where a series was expected, or the reverse.
    #[error("Wrong endpoint shape: expected {expected}, found {found}")]
    WrongEndpointShape {
        /// The shape the caller asked for
        expected: &'static str,
        /// The key that was found instead
        found: String,
    },

    /// None of the recognized series keys were present.
    #[error("No time series found (keys: {})", keys.join(", "))]
    NoTimeSeriesFound {
        /// Top-level keys seen in the payload
        keys: Vec<String>,
    },

    /// A required field of a quote payload is absent.
    #[error("Missing required field: {field}")]
    MissingQuoteField {
        /// Name of the first missing field
        field: String,
    },

    /// A field is present but its value does not parse.
    #[error("Invalid value for {field}: {value}")]
    InvalidField {
        /// Field name (or "date" for series keys)
        field: String,
        /// The raw value
        value: String,
    },

    /// A parsed bar violates the OHLC invariants.
    #[error("Invalid bar: {0}")]
    InvalidBar(String),

    /// A bar could not be written to storage. Reported alongside the
    /// delivered bars, never in place of them.
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl MarketDataError {
    /// Returns the message category for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use stocktracker_market_data::errors::{ErrorCategory, MarketDataError};
    ///
    /// let error = MarketDataError::UpstreamThrottled("5 calls per minute".to_string());
    /// assert_eq!(error.category(), ErrorCategory::RateLimitWait);
    ///
    /// let error = MarketDataError::UpstreamRejected("Invalid API call".to_string());
    /// assert_eq!(error.category(), ErrorCategory::InvalidSymbol);
    /// ```
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::LocalRateLimitExceeded { .. } | Self::UpstreamThrottled(_) => {
                ErrorCategory::RateLimitWait
            }
            Self::UpstreamRejected(_) => ErrorCategory::InvalidSymbol,
            Self::NoTimeSeriesFound { .. } => ErrorCategory::NoData,
            Self::TransportError { .. }
            | Self::MalformedPayload(_)
            | Self::WrongEndpointShape { .. }
            | Self::MissingQuoteField { .. }
            | Self::InvalidField { .. }
            | Self::InvalidBar(_)
            | Self::PersistenceError(_) => ErrorCategory::Generic,
        }
    }

    /// Notice shown to the user for this error.
    ///
    /// A local rate-limit rejection names the actual wait; everything else uses
    /// the category message.
    pub fn user_message(&self, symbol: &str) -> String {
        match self {
            Self::LocalRateLimitExceeded { retry_after } => format!(
                "API rate limit exceeded. Please wait {} seconds",
                wait_secs(*retry_after)
            ),
            other => other.category().message(symbol, &other.to_string()),
        }
    }

    /// Whether a synthetic series may replace the live result.
    ///
    /// Only unexpected failures qualify. Quota and rejection outcomes carry
    /// symbol- or budget-specific meaning and must reach the caller untouched.
    pub fn allows_synthetic_fallback(&self) -> bool {
        match self {
            Self::LocalRateLimitExceeded { .. }
            | Self::UpstreamThrottled(_)
            | Self::UpstreamRejected(_)
            | Self::PersistenceError(_) => false,
            Self::TransportError { .. }
            | Self::MalformedPayload(_)
            | Self::WrongEndpointShape { .. }
            | Self::NoTimeSeriesFound { .. }
            | Self::MissingQuoteField { .. }
            | Self::InvalidField { .. }
            | Self::InvalidBar(_) => true,
        }
    }
}

/// Whole seconds to wait, rounded up and never zero.
pub fn wait_secs(retry_after: Duration) -> u64 {
    retry_after.as_secs_f64().ceil().max(1.0) as u64
}
