//! Property-based integration tests for symbol history and failure outcomes.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;
use stocktracker_core::market_data::{FetchOutcome, SymbolHistory, SYMBOL_HISTORY_SIZE};
use stocktracker_core::Error;
use stocktracker_market_data::{ErrorCategory, MarketDataError, Symbol};

// =============================================================================
// Generators
// =============================================================================

fn arb_symbol() -> impl Strategy<Value = Symbol> {
    "[A-Z]{1,5}".prop_map(|s| Symbol::parse(&s).unwrap())
}

/// A history operation: `true` records, `false` removes.
fn arb_ops() -> impl Strategy<Value = Vec<(bool, Symbol)>> {
    prop::collection::vec((any::<bool>(), arb_symbol()), 0..40)
}

fn arb_market_error() -> impl Strategy<Value = MarketDataError> {
    prop_oneof![
        (1u64..120).prop_map(|s| MarketDataError::LocalRateLimitExceeded {
            retry_after: Duration::from_secs(s)
        }),
        "[a-z ]{1,30}".prop_map(MarketDataError::UpstreamThrottled),
        "[a-z ]{1,30}".prop_map(MarketDataError::UpstreamRejected),
        "[a-z ]{1,30}".prop_map(MarketDataError::MalformedPayload),
        prop::collection::vec("[A-Za-z ]{1,12}", 0..4)
            .prop_map(|keys| MarketDataError::NoTimeSeriesFound { keys }),
        (proptest::option::of(400u16..600), "[a-z ]{1,30}")
            .prop_map(|(status, message)| MarketDataError::TransportError { status, message }),
    ]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn history_is_bounded_unique_and_most_recent_first(ops in arb_ops()) {
        let history = SymbolHistory::new();
        let mut last_recorded: Option<Symbol> = None;

        for (record, symbol) in &ops {
            if *record {
                history.record(symbol);
                last_recorded = Some(symbol.clone());
            } else {
                history.remove(symbol);
                if last_recorded.as_ref() == Some(symbol) {
                    last_recorded = None;
                }
            }
        }

        let symbols = history.symbols();
        prop_assert!(symbols.len() <= SYMBOL_HISTORY_SIZE);

        let unique: HashSet<&Symbol> = symbols.iter().collect();
        prop_assert_eq!(unique.len(), symbols.len());

        if let Some(last) = last_recorded {
            prop_assert_eq!(symbols.first(), Some(&last));
        }
    }

    #[test]
    fn failed_outcome_category_matches_error(error in arb_market_error(), symbol in arb_symbol()) {
        let expected = error.category();
        let outcome = FetchOutcome::failed(symbol.as_str(), &Error::MarketData(error));

        match outcome {
            FetchOutcome::Failed { category, message } => {
                prop_assert_eq!(category, expected);
                prop_assert!(!message.is_empty());
                if category == ErrorCategory::NoData {
                    prop_assert!(message.contains(symbol.as_str()));
                }
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }
}
