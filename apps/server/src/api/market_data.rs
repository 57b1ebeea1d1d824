use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use stocktracker_core::market_data::{
    BarsResponse, ChartBounds, QuoteResponse, RateLimitStatus, DEFAULT_STORED_BARS_LIMIT,
};
use stocktracker_market_data::{MarketBar, Symbol};

/// Series plus the status line and axis bounds a chart needs.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BarsView {
    #[serde(flatten)]
    response: BarsResponse,
    message: String,
    chart_bounds: Option<ChartBounds>,
}

impl From<BarsResponse> for BarsView {
    fn from(response: BarsResponse) -> Self {
        Self {
            message: response.status_message(),
            chart_bounds: response.chart_bounds(),
            response,
        }
    }
}

async fn get_daily_bars(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BarsView>> {
    let response = state
        .market_data_service
        .get_daily_bars(&symbol)
        .await
        .map_err(|e| ApiError::fetch(&symbol, e))?;
    Ok(Json(response.into()))
}

async fn get_quote(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<QuoteResponse>> {
    let response = state
        .market_data_service
        .get_quote(&symbol)
        .await
        .map_err(|e| ApiError::fetch(&symbol, e))?;
    Ok(Json(response))
}

#[derive(Deserialize)]
struct StoredQuery {
    limit: Option<usize>,
}

async fn get_stored_bars(
    Path(symbol): Path<String>,
    Query(q): Query<StoredQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MarketBar>>> {
    let limit = q.limit.unwrap_or(DEFAULT_STORED_BARS_LIMIT);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }
    let bars = state
        .market_data_service
        .get_stored_bars(&symbol, limit)
        .await?;
    Ok(Json(bars))
}

async fn get_symbol_history(State(state): State<Arc<AppState>>) -> Json<Vec<Symbol>> {
    Json(state.market_data_service.recent_symbols())
}

async fn get_rate_limit_status(State(state): State<Arc<AppState>>) -> Json<RateLimitStatus> {
    Json(state.market_data_service.rate_limit_status())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market-data/history", get(get_symbol_history))
        .route("/market-data/rate-limit", get(get_rate_limit_status))
        .route("/market-data/{symbol}/bars", get(get_daily_bars))
        .route("/market-data/{symbol}/quote", get(get_quote))
        .route("/market-data/{symbol}/stored", get(get_stored_bars))
}
