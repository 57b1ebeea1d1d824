use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum ticker length accepted.
pub const MAX_SYMBOL_LEN: usize = 5;

/// Rejection reasons for user-supplied symbols.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Please enter a stock symbol")]
    Empty,

    #[error("Invalid symbol format '{0}'. Use 1-5 uppercase letters")]
    InvalidFormat(String),
}

/// A ticker symbol of 1-5 uppercase ASCII letters.
///
/// Construction goes through [`Symbol::parse`], so every `Symbol` in the
/// pipeline is already valid and downstream components never re-check it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Trim and uppercase `input`, then check the alphabet and length.
    pub fn parse(input: &str) -> Result<Self, SymbolError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(SymbolError::Empty);
        }
        if normalized.len() > MAX_SYMBOL_LEN || !normalized.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(SymbolError::InvalidFormat(input.trim().to_string()));
        }
        Ok(Self(Arc::from(normalized)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0.to_string()
    }
}
