use serde::{Deserialize, Serialize};

use stocktracker_market_data::{ErrorCategory, MarketBar, Symbol};

use crate::errors::{Error, ValidationError};

/// How a bar series was obtained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FetchOutcome {
    /// Parsed from a provider response.
    Live,
    /// Generated after an unexpected failure. `reason` is the failure text.
    Synthetic { reason: String },
    /// Nothing to show.
    Failed {
        category: ErrorCategory,
        message: String,
    },
}

impl FetchOutcome {
    /// Classify a pipeline error for the presentation layer.
    pub fn failed(symbol: &str, error: &Error) -> Self {
        let category = error.category();
        let message = match error {
            Error::Validation(ValidationError::Symbol(e)) => e.to_string(),
            Error::MarketData(e) => e.user_message(symbol),
            other => category.message(symbol, &other.to_string()),
        };
        FetchOutcome::Failed { category, message }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, FetchOutcome::Live)
    }
}

/// Bars handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarsResponse {
    pub symbol: Symbol,
    /// Most recent first.
    pub bars: Vec<MarketBar>,
    pub outcome: FetchOutcome,
    /// Bars that could not be written. The bars above are complete regardless.
    pub persistence_errors: Vec<String>,
}

impl BarsResponse {
    /// Status line for a delivered series.
    pub fn status_message(&self) -> String {
        match &self.outcome {
            FetchOutcome::Live => {
                format!("Loaded {} data points for {}", self.bars.len(), self.symbol)
            }
            FetchOutcome::Synthetic { reason } => format!(
                "Showing {} sample data points for {} ({})",
                self.bars.len(),
                self.symbol,
                reason
            ),
            FetchOutcome::Failed { message, .. } => message.clone(),
        }
    }

    /// Price bounds for charting, padded by 10% of the range on each side.
    pub fn chart_bounds(&self) -> Option<ChartBounds> {
        ChartBounds::from_bars(&self.bars)
    }
}

/// Vertical axis bounds for a bar chart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBounds {
    pub lower: f64,
    pub upper: f64,
    pub tick: f64,
}

impl ChartBounds {
    const PADDING_RATIO: f64 = 0.1;
    const TICKS: f64 = 10.0;

    pub fn from_bars(bars: &[MarketBar]) -> Option<Self> {
        let min = bars.iter().map(|b| b.low).reduce(f64::min)?;
        let max = bars.iter().map(|b| b.high).reduce(f64::max)?;
        let padding = (max - min) * Self::PADDING_RATIO;
        Some(ChartBounds {
            lower: min - padding,
            upper: max + padding,
            tick: (max - min) / Self::TICKS,
        })
    }
}

/// A single quote bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub symbol: Symbol,
    pub bar: MarketBar,
    pub persistence_errors: Vec<String>,
}

/// Snapshot of the local call budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub limited: bool,
    pub remaining: usize,
    pub retry_after_secs: u64,
}
