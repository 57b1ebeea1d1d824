use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use serde_json::{Map, Value};

use super::quote::GLOBAL_QUOTE_KEY;
use super::{check_provider_errors, invalid_field, parse_object, parse_price, parse_volume};
use crate::errors::MarketDataError;
use crate::models::{MarketBar, Symbol};
use crate::validator::BarValidator;

/// Most recent bars kept from a series payload.
pub const MAX_SERIES_BARS: usize = 30;

/// Sampling granularity of a located series.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SeriesGranularity {
    Daily,
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Minute60,
}

impl SeriesGranularity {
    pub fn is_intraday(&self) -> bool {
        !matches!(self, Self::Daily)
    }
}

/// Series keys in lookup order: daily first, then ascending minute granularity.
pub const SERIES_CANDIDATES: [(&str, SeriesGranularity); 6] = [
    ("Time Series (Daily)", SeriesGranularity::Daily),
    ("Time Series (1min)", SeriesGranularity::Minute1),
    ("Time Series (5min)", SeriesGranularity::Minute5),
    ("Time Series (15min)", SeriesGranularity::Minute15),
    ("Time Series (30min)", SeriesGranularity::Minute30),
    ("Time Series (60min)", SeriesGranularity::Minute60),
];

const OPEN: &str = "1. open";
const HIGH: &str = "2. high";
const LOW: &str = "3. low";
const CLOSE: &str = "4. close";
const VOLUME: &str = "5. volume";

/// Where the series lives in a payload.
#[derive(Debug, PartialEq)]
pub enum SeriesLocation<'a> {
    Found {
        granularity: SeriesGranularity,
        entries: &'a Map<String, Value>,
    },
    /// No series, but a quote-shaped record is present.
    WrongShape,
    /// Nothing recognizable; carries the sorted top-level keys.
    NotFound(Vec<String>),
}

/// Probe the candidate keys in order and report the first present series.
pub fn locate_series(payload: &Map<String, Value>) -> SeriesLocation<'_> {
    let found = SERIES_CANDIDATES.iter().find_map(|(key, granularity)| {
        payload
            .get(*key)
            .and_then(Value::as_object)
            .map(|entries| (*granularity, entries))
    });

    match found {
        Some((granularity, entries)) => SeriesLocation::Found {
            granularity,
            entries,
        },
        None if payload.contains_key(GLOBAL_QUOTE_KEY) => SeriesLocation::WrongShape,
        None => {
            let mut keys: Vec<String> = payload.keys().cloned().collect();
            keys.sort();
            SeriesLocation::NotFound(keys)
        }
    }
}

/// Parse a series body into at most [`MAX_SERIES_BARS`] bars, most recent first.
///
/// The payload is normalized as a whole: one bad entry fails the call, even
/// when it would have been cut by the cap.
pub fn parse_daily_series(symbol: &Symbol, body: &str) -> Result<Vec<MarketBar>, MarketDataError> {
    let payload = parse_object(body)?;
    check_provider_errors(&payload)?;

    let (granularity, entries) = match locate_series(&payload) {
        SeriesLocation::Found {
            granularity,
            entries,
        } => (granularity, entries),
        SeriesLocation::WrongShape => {
            return Err(MarketDataError::WrongEndpointShape {
                expected: "time series",
                found: GLOBAL_QUOTE_KEY.to_string(),
            })
        }
        SeriesLocation::NotFound(keys) => return Err(MarketDataError::NoTimeSeriesFound { keys }),
    };

    let mut dated = entries
        .iter()
        .map(|(date, entry)| {
            bar_from_entry(symbol, date, entry, granularity).map(|bar| (date.as_str(), bar))
        })
        .collect::<Result<Vec<(&str, MarketBar)>, MarketDataError>>()?;

    // ISO dates are fixed width and zero padded, so string order is time order.
    dated.sort_by(|a, b| b.0.cmp(a.0));
    dated.truncate(MAX_SERIES_BARS);

    let bars: Vec<MarketBar> = dated.into_iter().map(|(_, bar)| bar).collect();
    BarValidator::new().validate_all(&bars)?;

    debug!(
        "Parsed {} {:?} bars for {} ({} entries in payload)",
        bars.len(),
        granularity,
        symbol,
        entries.len()
    );

    Ok(bars)
}

fn bar_from_entry(
    symbol: &Symbol,
    date: &str,
    entry: &Value,
    granularity: SeriesGranularity,
) -> Result<MarketBar, MarketDataError> {
    let timestamp = parse_timestamp(date, granularity)
        .ok_or_else(|| invalid_field("date", &Value::String(date.to_string())))?;

    let fields = entry.as_object().ok_or_else(|| {
        MarketDataError::MalformedPayload(format!("series entry for {} is not an object", date))
    })?;
    let field = |name: &str| {
        fields.get(name).ok_or_else(|| MarketDataError::InvalidField {
            field: name.to_string(),
            value: "<missing>".to_string(),
        })
    };

    Ok(MarketBar::new(
        symbol.clone(),
        timestamp,
        parse_price(OPEN, field(OPEN)?)?,
        parse_price(HIGH, field(HIGH)?)?,
        parse_price(LOW, field(LOW)?)?,
        parse_price(CLOSE, field(CLOSE)?)?,
        parse_volume(VOLUME, field(VOLUME)?)?,
    ))
}

/// Daily keys are `YYYY-MM-DD` (midnight UTC); intraday keys carry a time.
fn parse_timestamp(key: &str, granularity: SeriesGranularity) -> Option<DateTime<Utc>> {
    if granularity.is_intraday() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(key, "%Y-%m-%d %H:%M:%S") {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
