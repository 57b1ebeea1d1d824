//! Market data module - acquisition service, response models, and storage traits.
//!
//! ```text
//! MarketDataService → RateLimiter → MarketDataSource → parser
//!        ↓                                                ↓
//!    BarStore (DB)  ←──────────── bars ───────────────────┘
//! ```

mod market_data_constants;
mod market_data_model;
mod market_data_service;
mod market_data_traits;
mod symbol_history;

#[cfg(test)]
mod market_data_service_tests;

// Re-export the public interface
pub use market_data_constants::*;
pub use market_data_model::{
    BarsResponse, ChartBounds, FetchOutcome, QuoteResponse, RateLimitStatus,
};
pub use market_data_service::{FallbackPolicy, MarketDataService};
pub use market_data_traits::{BarStore, MarketDataServiceTrait};
pub use symbol_history::SymbolHistory;
