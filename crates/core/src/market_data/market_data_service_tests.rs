//! Tests for MarketDataService ordering and failure handling.
//!
//! # Contract Points
//!
//! 1. Symbol validation runs before admission and never consumes a slot
//! 2. A rejected admission never reaches the source
//! 3. Quota and rejection errors are surfaced, never replaced by synthetic bars
//! 4. A failed write does not abort the remaining writes or the delivery

#[cfg(test)]
mod tests {
    use crate::errors::{DatabaseError, Error, Result, ValidationError};
    use crate::market_data::{
        BarStore, FallbackPolicy, FetchOutcome, MarketDataService, MarketDataServiceTrait,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use stocktracker_market_data::{
        MarketBar, MarketDataError, MarketDataSource, RateLimiter, Symbol, SyntheticGenerator,
        SYNTHETIC_BARS,
    };

    // =========================================================================
    // Scripted source
    // =========================================================================

    /// Replays queued bodies; falls back to `default` when the queue is empty.
    struct ScriptedSource {
        responses: Mutex<VecDeque<std::result::Result<String, MarketDataError>>>,
        default: std::result::Result<String, MarketDataError>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn always(body: std::result::Result<String, MarketDataError>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                default: body,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn next(&self) -> std::result::Result<String, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default.clone())
        }
    }

    #[async_trait]
    impl MarketDataSource for ScriptedSource {
        fn id(&self) -> &'static str {
            "SCRIPTED"
        }

        async fn fetch_series(
            &self,
            _symbol: &Symbol,
        ) -> std::result::Result<String, MarketDataError> {
            self.next()
        }

        async fn fetch_quote(
            &self,
            _symbol: &Symbol,
        ) -> std::result::Result<String, MarketDataError> {
            self.next()
        }
    }

    // =========================================================================
    // Mock BarStore
    // =========================================================================

    #[derive(Default)]
    struct MockBarStore {
        bars: Mutex<Vec<MarketBar>>,
        /// Writes with these dates fail.
        fail_dates: Mutex<Vec<String>>,
        attempts: AtomicUsize,
    }

    impl MockBarStore {
        fn failing_on(dates: &[&str]) -> Self {
            let store = Self::default();
            *store.fail_dates.lock().unwrap() = dates.iter().map(|d| d.to_string()).collect();
            store
        }

        fn stored(&self) -> Vec<MarketBar> {
            self.bars.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BarStore for MockBarStore {
        async fn store(&self, _symbol: &Symbol, bar: &MarketBar) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let date = bar.timestamp.format("%Y-%m-%d").to_string();
            if self.fail_dates.lock().unwrap().contains(&date) {
                return Err(DatabaseError::QueryFailed("database is locked".to_string()).into());
            }
            self.bars.lock().unwrap().push(bar.clone());
            Ok(())
        }

        async fn history(&self, symbol: &Symbol, limit: usize) -> Result<Vec<MarketBar>> {
            let mut bars: Vec<MarketBar> = self
                .bars
                .lock()
                .unwrap()
                .iter()
                .filter(|b| &b.symbol == symbol)
                .cloned()
                .collect();
            bars.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            bars.truncate(limit);
            Ok(bars)
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn series_body(days: u32) -> String {
        let mut series = serde_json::Map::new();
        for day in 1..=days {
            series.insert(
                format!("2024-01-{:02}", day),
                json!({
                    "1. open": "10.0",
                    "2. high": "12.0",
                    "3. low": "9.0",
                    "4. close": "11.0",
                    "5. volume": "1000"
                }),
            );
        }
        json!({
            "Meta Data": { "2. Symbol": "AAPL" },
            "Time Series (Daily)": series
        })
        .to_string()
    }

    fn service(
        source: Arc<ScriptedSource>,
        store: Arc<MockBarStore>,
    ) -> (MarketDataService, Arc<RateLimiter>) {
        let limiter = Arc::new(RateLimiter::new());
        let service = MarketDataService::new(limiter.clone(), source, store)
            .with_generator(SyntheticGenerator::with_seed(1));
        (service, limiter)
    }

    // =========================================================================
    // Admission
    // =========================================================================

    #[tokio::test]
    async fn test_sixth_request_is_rejected_without_network() {
        let source = Arc::new(ScriptedSource::always(Ok(series_body(3))));
        let store = Arc::new(MockBarStore::default());
        let (service, _) = service(source.clone(), store);

        for _ in 0..5 {
            let response = service.get_daily_bars("AAPL").await.unwrap();
            assert_eq!(response.outcome, FetchOutcome::Live);
        }

        let err = service.get_daily_bars("AAPL").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::LocalRateLimitExceeded { .. })
        ));
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn test_invalid_symbol_consumes_no_slot() {
        let source = Arc::new(ScriptedSource::always(Ok(series_body(3))));
        let (service, limiter) = service(source.clone(), Arc::new(MockBarStore::default()));

        for input in ["", "   ", "TOOLONG", "AB1"] {
            let err = service.get_daily_bars(input).await.unwrap_err();
            assert!(matches!(err, Error::Validation(ValidationError::Symbol(_))));
        }
        assert_eq!(limiter.remaining(), 5);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_lowercase_input_is_normalized() {
        let source = Arc::new(ScriptedSource::always(Ok(series_body(2))));
        let (service, _) = service(source, Arc::new(MockBarStore::default()));

        let response = service.get_daily_bars(" ibm ").await.unwrap();
        assert_eq!(response.symbol.as_str(), "IBM");
    }

    // =========================================================================
    // Live path
    // =========================================================================

    #[tokio::test]
    async fn test_live_bars_are_persisted_and_recorded() {
        let source = Arc::new(ScriptedSource::always(Ok(series_body(3))));
        let store = Arc::new(MockBarStore::default());
        let (service, _) = service(source, store.clone());

        let response = service.get_daily_bars("IBM").await.unwrap();
        assert_eq!(response.bars.len(), 3);
        assert!(response.persistence_errors.is_empty());
        assert_eq!(store.stored().len(), 3);
        assert_eq!(service.recent_symbols(), vec![Symbol::parse("IBM").unwrap()]);
        assert_eq!(response.status_message(), "Loaded 3 data points for IBM");
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_abort_other_writes() {
        let source = Arc::new(ScriptedSource::always(Ok(series_body(3))));
        let store = Arc::new(MockBarStore::failing_on(&["2024-01-02"]));
        let (service, _) = service(source, store.clone());

        let response = service.get_daily_bars("IBM").await.unwrap();
        assert_eq!(response.outcome, FetchOutcome::Live);
        assert_eq!(response.bars.len(), 3);
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(store.stored().len(), 2);
        assert_eq!(response.persistence_errors.len(), 1);
        assert!(response.persistence_errors[0].contains("IBM 2024-01-02"));
    }

    // =========================================================================
    // Failure handling
    // =========================================================================

    #[tokio::test]
    async fn test_transport_failure_serves_synthetic_bars() {
        let source = Arc::new(ScriptedSource::always(Err(MarketDataError::TransportError {
            status: Some(503),
            message: "HTTP 503".to_string(),
        })));
        let store = Arc::new(MockBarStore::default());
        let (service, _) = service(source, store.clone());

        let response = service.get_daily_bars("MSFT").await.unwrap();
        assert_eq!(response.bars.len(), SYNTHETIC_BARS);
        assert_eq!(
            response.outcome,
            FetchOutcome::Synthetic {
                reason: "Transport error: HTTP 503".to_string()
            }
        );
        assert!(store.stored().is_empty());
        assert!(service.recent_symbols().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_disabled_surfaces_error() {
        let source = Arc::new(ScriptedSource::always(Ok("<html>".to_string())));
        let limiter = Arc::new(RateLimiter::new());
        let service =
            MarketDataService::new(limiter, source, Arc::new(MockBarStore::default()))
                .with_fallback(FallbackPolicy::Disabled);

        let err = service.get_daily_bars("MSFT").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_upstream_throttle_is_surfaced_and_closes_limiter() {
        let body = json!({ "Note": "Thank you for using Alpha Vantage!" }).to_string();
        let source = Arc::new(ScriptedSource::always(Ok(body)));
        let (service, limiter) = service(source.clone(), Arc::new(MockBarStore::default()));

        let err = service.get_daily_bars("AAPL").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::UpstreamThrottled(_))
        ));
        assert!(limiter.is_limited());
        assert!(service.rate_limit_status().limited);

        let err = service.get_daily_bars("AAPL").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::LocalRateLimitExceeded { .. })
        ));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejection_is_surfaced_and_leaves_history() {
        let source = Arc::new(ScriptedSource::always(Ok(series_body(2))));
        source.responses.lock().unwrap().extend([
            Ok(series_body(2)),
            Ok(json!({ "Error Message": "Invalid API call." }).to_string()),
        ]);
        let (service, _) = service(source, Arc::new(MockBarStore::default()));

        service.get_daily_bars("XYZ").await.unwrap();
        assert_eq!(service.recent_symbols().len(), 1);

        let err = service.get_daily_bars("XYZ").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::UpstreamRejected(_))
        ));
        assert!(service.recent_symbols().is_empty());
    }

    #[tokio::test]
    async fn test_missing_series_falls_back_and_leaves_history() {
        let source = Arc::new(ScriptedSource::always(Ok(
            json!({ "Meta Data": {} }).to_string()
        )));
        source.responses.lock().unwrap().push_back(Ok(series_body(2)));
        let (service, _) = service(source, Arc::new(MockBarStore::default()));

        service.get_daily_bars("IBM").await.unwrap();
        let response = service.get_daily_bars("IBM").await.unwrap();
        assert!(matches!(response.outcome, FetchOutcome::Synthetic { .. }));
        assert!(service.recent_symbols().is_empty());
    }

    // =========================================================================
    // Quote and stored reads
    // =========================================================================

    #[tokio::test]
    async fn test_quote_is_persisted() {
        let body = json!({
            "Global Quote": {
                "02. open": "148.0",
                "03. high": "152.0",
                "04. low": "147.5",
                "05. price": "150.25",
                "06. volume": "3456789"
            }
        })
        .to_string();
        let source = Arc::new(ScriptedSource::always(Ok(body)));
        let store = Arc::new(MockBarStore::default());
        let (service, limiter) = service(source, store.clone());

        let response = service.get_quote("IBM").await.unwrap();
        assert_eq!(response.bar.close, 150.25);
        assert_eq!(store.stored().len(), 1);
        assert_eq!(limiter.remaining(), 4);
    }

    #[tokio::test]
    async fn test_quote_never_falls_back() {
        let source = Arc::new(ScriptedSource::always(Ok(
            json!({ "Global Quote": { "02. open": "1" } }).to_string()
        )));
        let (service, _) = service(source, Arc::new(MockBarStore::default()));

        let err = service.get_quote("IBM").await.unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::MissingQuoteField { .. })
        ));
    }

    #[tokio::test]
    async fn test_stored_bars_read_back_most_recent_first() {
        let source = Arc::new(ScriptedSource::always(Ok(series_body(5))));
        let store = Arc::new(MockBarStore::default());
        let (service, limiter) = service(source, store);

        service.get_daily_bars("IBM").await.unwrap();
        let stored = service.get_stored_bars("IBM", 2).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].timestamp > stored[1].timestamp);

        // Stored reads do not touch the limiter.
        assert_eq!(limiter.remaining(), 4);
    }
}
