use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use super::model::{NewStockBarDB, StockBarDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::stock_bars::dsl as bars_dsl;
use stocktracker_core::errors::{Error, Result};
use stocktracker_core::market_data::BarStore;
use stocktracker_market_data::{MarketBar, Symbol};

/// SQLite-backed [`BarStore`].
///
/// A bar is keyed by symbol and timestamp; storing the same day twice keeps
/// the latest values.
pub struct BarRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BarRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl BarStore for BarRepository {
    async fn store(&self, symbol: &Symbol, bar: &MarketBar) -> Result<()> {
        let row = NewStockBarDB::from_bar(symbol, bar);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::replace_into(bars_dsl::stock_bars)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn history(&self, symbol: &Symbol, limit: usize) -> Result<Vec<MarketBar>> {
        let pool = Arc::clone(&self.pool);
        let symbol_str = symbol.as_str().to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<StockBarDB>> {
            let mut conn = get_connection(&pool)?;
            bars_dsl::stock_bars
                .filter(bars_dsl::symbol.eq(symbol_str))
                .order(bars_dsl::timestamp.desc())
                .limit(limit)
                .select(StockBarDB::as_select())
                .load::<StockBarDB>(&mut conn)
                .into_core()
        })
        .await
        .map_err(|e| Error::Unexpected(format!("Stored bar query panicked: {}", e)))??;

        debug!("Read {} stored bars for {}", rows.len(), symbol);
        rows.into_iter().map(MarketBar::try_from).collect()
    }
}
