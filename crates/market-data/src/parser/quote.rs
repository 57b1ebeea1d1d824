use chrono::Utc;
use serde_json::{Map, Value};

use super::series::{locate_series, SeriesLocation};
use super::{check_provider_errors, parse_object, parse_price, parse_volume};
use crate::errors::MarketDataError;
use crate::models::{MarketBar, Symbol};
use crate::validator::BarValidator;

/// Key holding the record in a `GLOBAL_QUOTE` response.
pub const GLOBAL_QUOTE_KEY: &str = "Global Quote";

/// Fields a quote must carry, checked in this order before any is read.
/// The provider's "price" is the bar's close.
pub const REQUIRED_QUOTE_FIELDS: [&str; 5] =
    ["02. open", "03. high", "04. low", "05. price", "06. volume"];

/// Parse a full `GLOBAL_QUOTE` response body into one bar stamped "now".
pub fn parse_quote_payload(symbol: &Symbol, body: &str) -> Result<MarketBar, MarketDataError> {
    let payload = parse_object(body)?;
    check_provider_errors(&payload)?;

    match payload.get(GLOBAL_QUOTE_KEY) {
        Some(Value::Object(quote)) if quote.is_empty() => {
            // The provider answers unknown symbols with an empty record.
            Err(MarketDataError::UpstreamRejected(format!(
                "No quote available for {}",
                symbol
            )))
        }
        Some(Value::Object(quote)) => parse_global_quote(symbol, quote),
        Some(_) => Err(MarketDataError::MalformedPayload(format!(
            "{} is not an object",
            GLOBAL_QUOTE_KEY
        ))),
        None => match locate_series(&payload) {
            SeriesLocation::Found { .. } => Err(MarketDataError::WrongEndpointShape {
                expected: "quote",
                found: "time series".to_string(),
            }),
            SeriesLocation::WrongShape | SeriesLocation::NotFound(_) => {
                let mut keys: Vec<String> = payload.keys().cloned().collect();
                keys.sort();
                Err(MarketDataError::MalformedPayload(format!(
                    "missing {} (keys: {})",
                    GLOBAL_QUOTE_KEY,
                    keys.join(", ")
                )))
            }
        },
    }
}

/// Convert a quote record into a bar.
///
/// All required fields are checked for presence first, so a missing field is
/// reported by name even when another field holds garbage.
pub fn parse_global_quote(
    symbol: &Symbol,
    quote: &Map<String, Value>,
) -> Result<MarketBar, MarketDataError> {
    if let Some(missing) = REQUIRED_QUOTE_FIELDS
        .iter()
        .find(|field| !quote.contains_key(**field))
    {
        return Err(MarketDataError::MissingQuoteField {
            field: missing.to_string(),
        });
    }

    let [open, high, low, price, volume] = REQUIRED_QUOTE_FIELDS;
    let bar = MarketBar::new(
        symbol.clone(),
        Utc::now(),
        parse_price(open, &quote[open])?,
        parse_price(high, &quote[high])?,
        parse_price(low, &quote[low])?,
        parse_price(price, &quote[price])?,
        parse_volume(volume, &quote[volume])?,
    );

    BarValidator::new().validate(&bar)?;
    Ok(bar)
}
