use serde::{Deserialize, Serialize};

/// User-facing message category for a failed request.
///
/// | Category | Raised by |
/// |----------|-----------|
/// | `RateLimitWait` | local budget spent, provider throttle marker |
/// | `InvalidSymbol` | provider rejected the symbol |
/// | `NoData` | no recognizable time series in the payload |
/// | `Generic` | everything else |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    RateLimitWait,
    InvalidSymbol,
    NoData,
    Generic,
}

impl ErrorCategory {
    /// Human-readable notice for this category.
    ///
    /// `detail` is the underlying error text; only the generic category shows it.
    pub fn message(&self, symbol: &str, detail: &str) -> String {
        match self {
            Self::RateLimitWait => "API rate limit exceeded. Please wait 1 minute".to_string(),
            Self::InvalidSymbol => format!("Symbol {} was not recognized by the provider", symbol),
            Self::NoData => format!("No data available for {}", symbol),
            Self::Generic => format!("API Error: {}", detail),
        }
    }
}
