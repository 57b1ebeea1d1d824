use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stocktracker_core::errors::Error as CoreError;
use stocktracker_core::market_data::FetchOutcome;
use stocktracker_market_data::errors::wait_secs;
use stocktracker_market_data::{ErrorCategory, MarketDataError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    /// A pipeline failure for a specific symbol; rendered with its user-facing message.
    #[error("{error}")]
    Fetch { symbol: String, error: CoreError },
    #[error("{0}")]
    BadRequest(String),
    // Surface the underlying error message to help debugging during development
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl ApiError {
    pub fn fetch(symbol: &str, error: CoreError) -> Self {
        ApiError::Fetch {
            symbol: symbol.to_string(),
            error,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<ErrorCategory>,
    message: String,
}

fn core_status(error: &CoreError) -> StatusCode {
    match error {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::MarketData(e) => match e.category() {
            ErrorCategory::RateLimitWait => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::InvalidSymbol | ErrorCategory::NoData => StatusCode::NOT_FOUND,
            ErrorCategory::Generic => match e {
                MarketDataError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
        },
        CoreError::Database(_) | CoreError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn retry_after(error: &CoreError) -> Option<HeaderValue> {
    match error {
        CoreError::MarketData(MarketDataError::LocalRateLimitExceeded { retry_after }) => {
            HeaderValue::from_str(&wait_secs(*retry_after).to_string()).ok()
        }
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, category, message, retry) = match &self {
            ApiError::Core(e) => (
                core_status(e),
                Some(e.category()),
                e.to_string(),
                retry_after(e),
            ),
            ApiError::Fetch { symbol, error } => {
                let (category, message) = match FetchOutcome::failed(symbol, error) {
                    FetchOutcome::Failed { category, message } => (Some(category), message),
                    _ => (None, error.to_string()),
                };
                (core_status(error), category, message, retry_after(error))
            }
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, None, reason.clone(), None),
            ApiError::Anyhow(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
                self.to_string(),
                None,
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(ErrorBody {
            code: status.as_u16(),
            category,
            message,
        });
        let mut response = (status, body).into_response();
        if let Some(value) = retry {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
