//! Market data models
//!
//! - `bar` - The normalized OHLCV record (MarketBar)
//! - `symbol` - Validated ticker symbol (Symbol)

mod bar;
mod symbol;

pub use bar::MarketBar;
pub use symbol::{Symbol, SymbolError};
