//! Bar data validation.
//!
//! Every bar leaving this crate, live or synthetic, passes the same checks:
//! - Prices finite and non-negative
//! - OHLC invariants (high >= low, open/close inside high/low)
//! - Reasonable value ranges (soft)

use log::warn;

use crate::errors::MarketDataError;
use crate::models::MarketBar;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - reject the bar.
    Hard,
    /// Soft warning - accept the bar but log.
    Soft,
}

#[derive(Clone, Debug)]
struct ValidationIssue {
    severity: ValidationSeverity,
    message: String,
}

/// Bar validator configuration.
#[derive(Clone, Debug)]
struct ValidatorConfig {
    /// Maximum price before a warning is logged.
    max_price: Option<f64>,
    /// Whether to warn on zero volume.
    warn_on_zero_volume: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Some(1_000_000_000.0), // 1 billion as sanity check
            warn_on_zero_volume: true,
        }
    }
}

/// Validates normalized bars.
#[derive(Clone, Debug, Default)]
pub struct BarValidator {
    config: ValidatorConfig,
}

impl BarValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a bar.
    ///
    /// Returns `InvalidBar` listing every hard issue. Soft issues are logged.
    pub fn validate(&self, bar: &MarketBar) -> Result<(), MarketDataError> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        self.validate_prices(bar, &mut issues);
        self.validate_ohlc_invariants(bar, &mut issues);
        self.validate_price_range(bar, &mut issues);
        self.validate_volume(bar, &mut issues);

        let errors: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !errors.is_empty() {
            return Err(MarketDataError::InvalidBar(format!(
                "{} {}: {}",
                bar.symbol,
                bar.timestamp.format("%Y-%m-%d"),
                errors.join("; ")
            )));
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!(
                "Bar validation warning for {} at {}: {}",
                bar.symbol, bar.timestamp, issue.message
            );
        }

        Ok(())
    }

    /// Validate a whole series, failing on the first invalid bar.
    pub fn validate_all(&self, bars: &[MarketBar]) -> Result<(), MarketDataError> {
        bars.iter().try_for_each(|bar| self.validate(bar))
    }

    fn validate_prices(&self, bar: &MarketBar, issues: &mut Vec<ValidationIssue>) {
        for (name, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !value.is_finite() {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Non-finite {} price: {}", name, value),
                });
            } else if value < 0.0 {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Negative {} price: {}", name, value),
                });
            }
        }
    }

    fn validate_ohlc_invariants(&self, bar: &MarketBar, issues: &mut Vec<ValidationIssue>) {
        if bar.satisfies_ohlc() {
            return;
        }

        if bar.high < bar.low {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("High ({}) is less than Low ({})", bar.high, bar.low),
            });
        }

        if bar.open < bar.low || bar.open > bar.high {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!(
                    "Open ({}) is outside High/Low range ({}-{})",
                    bar.open, bar.low, bar.high
                ),
            });
        }

        if bar.close < bar.low || bar.close > bar.high {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!(
                    "Close ({}) is outside High/Low range ({}-{})",
                    bar.close, bar.low, bar.high
                ),
            });
        }
    }

    fn validate_price_range(&self, bar: &MarketBar, issues: &mut Vec<ValidationIssue>) {
        if let Some(max_price) = self.config.max_price {
            if bar.high > max_price {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!(
                        "High price ({}) exceeds max threshold ({})",
                        bar.high, max_price
                    ),
                });
            }
        }
    }

    fn validate_volume(&self, bar: &MarketBar, issues: &mut Vec<ValidationIssue>) {
        if self.config.warn_on_zero_volume && bar.volume == 0 {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Zero volume".to_string(),
            });
        }
    }
}
