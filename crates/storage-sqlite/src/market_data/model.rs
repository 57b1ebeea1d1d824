//! Database models for stored bars.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use stocktracker_core::errors::{DatabaseError, Error, Result};
use stocktracker_market_data::{MarketBar, Symbol};

/// Row in `stock_bars`.
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::stock_bars)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StockBarDB {
    pub id: i32,
    pub symbol: String,
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub created_at: String,
}

/// Insert form; `id` and `created_at` are filled by SQLite.
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::stock_bars)]
pub struct NewStockBarDB {
    pub symbol: String,
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl NewStockBarDB {
    pub fn from_bar(symbol: &Symbol, bar: &MarketBar) -> Self {
        Self {
            symbol: symbol.as_str().to_string(),
            timestamp: bar.timestamp.to_rfc3339(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: i64::try_from(bar.volume).unwrap_or(i64::MAX),
        }
    }
}

impl TryFrom<StockBarDB> for MarketBar {
    type Error = Error;

    fn try_from(row: StockBarDB) -> Result<Self> {
        let symbol = Symbol::parse(&row.symbol)?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                DatabaseError::Internal(format!(
                    "Bad timestamp '{}' in stock_bars row {}: {}",
                    row.timestamp, row.id, e
                ))
            })?;
        let volume = u64::try_from(row.volume).map_err(|_| {
            DatabaseError::Internal(format!(
                "Negative volume {} in stock_bars row {}",
                row.volume, row.id
            ))
        })?;

        Ok(MarketBar::new(
            symbol, timestamp, row.open, row.high, row.low, row.close, volume,
        ))
    }
}
