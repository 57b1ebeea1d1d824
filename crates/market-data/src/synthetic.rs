//! Synthetic bar series used when live retrieval fails unexpectedly.
//!
//! The series is a bounded random walk over the last 30 days. The starting
//! price is derived from the symbol's md5 digest so the same symbol lands on
//! the same base price across runs. Every bar satisfies the OHLC invariants.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{MarketBar, Symbol};

/// Bars produced per series, matching the live series cap.
pub const SYNTHETIC_BARS: usize = 30;

const BASE_PRICE_MIN: f64 = 100.0;
/// Base prices fall in `[100, 150)`, expressed in cents above the minimum.
const BASE_PRICE_SPAN_CENTS: u64 = 5_000;

const OPEN_DRIFT: f64 = 5.0;
const CLOSE_DRIFT: f64 = 4.0;
const WICK: f64 = 5.0;
const VOLUME_MIN: u64 = 1_000_000;
const VOLUME_MAX: u64 = 6_000_000;

/// Produces plausible OHLCV series. Never fails.
#[derive(Clone, Debug, Default)]
pub struct SyntheticGenerator {
    seed: Option<u64>,
}

impl SyntheticGenerator {
    /// Generator drawing from OS entropy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose random walk is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Deterministic starting price for `symbol`, in `[100, 150)`.
    pub fn base_price(symbol: &Symbol) -> f64 {
        let digest = md5::compute(symbol.as_str().as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.0[..8]);
        let cents = u64::from_be_bytes(head) % BASE_PRICE_SPAN_CENTS;
        BASE_PRICE_MIN + cents as f64 / 100.0
    }

    /// 30 daily bars ending today, most recent first.
    pub fn generate(&self, symbol: &Symbol) -> Vec<MarketBar> {
        self.generate_ending(symbol, Utc::now())
    }

    /// 30 daily bars ending on the day of `end`, most recent first.
    pub fn generate_ending(&self, symbol: &Symbol, end: DateTime<Utc>) -> Vec<MarketBar> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let last_day = end
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(end);

        let mut prev_close = Self::base_price(symbol);
        let mut bars: Vec<MarketBar> = (0..SYNTHETIC_BARS as i64)
            .rev()
            .map(|days_back| {
                let open = (prev_close + rng.gen_range(-OPEN_DRIFT..OPEN_DRIFT)).max(0.0);
                let close = (open + rng.gen_range(-CLOSE_DRIFT..CLOSE_DRIFT)).max(0.0);
                let high = (open + rng.gen_range(0.0..WICK)).max(open).max(close);
                let low = (open - rng.gen_range(0.0..WICK)).min(open).min(close).max(0.0);
                let volume = rng.gen_range(VOLUME_MIN..VOLUME_MAX);
                prev_close = close;

                MarketBar::new(
                    symbol.clone(),
                    last_day - Duration::days(days_back),
                    open,
                    high,
                    low,
                    close,
                    volume,
                )
            })
            .collect();

        bars.reverse();
        bars
    }
}
