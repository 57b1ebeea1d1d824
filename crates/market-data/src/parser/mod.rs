//! Payload interpretation for Alpha Vantage responses.
//!
//! - `series` - daily/intraday time series into bars (most recent first, capped)
//! - `quote` - `GLOBAL_QUOTE` record into a single bar
//!
//! Both start with the same gates: the body must be a JSON object, and the
//! provider's own throttle/error markers are checked before anything else.

mod quote;
mod series;

pub use quote::{parse_global_quote, parse_quote_payload};
pub use series::parse_daily_series;

use log::warn;
use serde_json::{Map, Value};

use crate::errors::MarketDataError;

const NOTE_KEY: &str = "Note";
const ERROR_MESSAGE_KEY: &str = "Error Message";
const INFORMATION_KEY: &str = "Information";

/// Parse `body` into a top-level JSON object.
fn parse_object(body: &str) -> Result<Map<String, Value>, MarketDataError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(MarketDataError::MalformedPayload(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(MarketDataError::MalformedPayload(e.to_string())),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn text_of(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// Classify provider-level markers.
///
/// "Note" always means the provider is throttling us and wins over everything
/// else in the payload. "Error Message" is a rejection. "Information" is the
/// newer throttle wording when it talks about call frequency; otherwise it is
/// only logged.
fn check_provider_errors(payload: &Map<String, Value>) -> Result<(), MarketDataError> {
    if let Some(note) = payload.get(NOTE_KEY) {
        return Err(MarketDataError::UpstreamThrottled(text_of(note)));
    }

    if let Some(message) = payload.get(ERROR_MESSAGE_KEY) {
        return Err(MarketDataError::UpstreamRejected(text_of(message)));
    }

    if let Some(info) = payload.get(INFORMATION_KEY) {
        let info = text_of(info);
        let lower = info.to_lowercase();
        if lower.contains("rate limit") || lower.contains("call frequency") {
            return Err(MarketDataError::UpstreamThrottled(info));
        }
        warn!("Alpha Vantage info: {}", info);
    }

    Ok(())
}

/// Read a price field. Accepts JSON strings (the provider's format) and numbers.
fn parse_price(field: &str, value: &Value) -> Result<f64, MarketDataError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_field(field, value))
}

/// Read a share count field.
fn parse_volume(field: &str, value: &Value) -> Result<u64, MarketDataError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid_field(field, value))
}

fn invalid_field(field: &str, value: &Value) -> MarketDataError {
    MarketDataError::InvalidField {
        field: field.to_string(),
        value: text_of(value),
    }
}
