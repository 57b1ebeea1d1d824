use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use log::warn;

use stocktracker_market_data::Symbol;

use super::market_data_constants::SYMBOL_HISTORY_SIZE;

/// Recently loaded symbols, most recent first, without duplicates.
#[derive(Debug)]
pub struct SymbolHistory {
    entries: Mutex<VecDeque<Symbol>>,
    capacity: usize,
}

impl SymbolHistory {
    pub fn new() -> Self {
        Self::with_capacity(SYMBOL_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, VecDeque<Symbol>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Symbol history mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Move `symbol` to the front, dropping the oldest entry past capacity.
    pub fn record(&self, symbol: &Symbol) {
        let mut entries = self.lock_entries();
        entries.retain(|s| s != symbol);
        entries.push_front(symbol.clone());
        entries.truncate(self.capacity);
    }

    pub fn remove(&self, symbol: &Symbol) {
        self.lock_entries().retain(|s| s != symbol);
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.lock_entries().iter().cloned().collect()
    }
}

impl Default for SymbolHistory {
    fn default() -> Self {
        Self::new()
    }
}
