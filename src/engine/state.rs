//! Price store - process-wide table of the latest quote per instrument.
//!
//! Written by the feed connection manager, read by the execution pipeline
//! and anything presenting prices. Last write wins per symbol.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

use chrono::Utc;

use crate::types::{Quote, Symbol};

pub struct PriceStore {
    quotes: RwLock<HashMap<Symbol, Quote>>,
    loading: RwLock<bool>,
    error: RwLock<Option<String>>,
}

impl PriceStore {
    /// Starts in the loading state until the first quote or error arrives.
    pub fn new() -> Self {
        Self {
            quotes: RwLock::new(HashMap::new()),
            loading: RwLock::new(true),
            error: RwLock::new(None),
        }
    }

    /// Replace or insert the entry for the quote's symbol, stamping it
    /// with the arrival time.
    pub fn upsert(&self, mut quote: Quote) {
        quote.updated_at = Utc::now();
        self.quotes.write().insert(quote.symbol.clone(), quote);
        *self.loading.write() = false;
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Quote> {
        self.quotes.read().get(symbol).cloned()
    }

    /// Latest price for a symbol, if any quote has arrived.
    pub fn price_of(&self, symbol: &Symbol) -> Option<Decimal> {
        self.quotes.read().get(symbol).map(|q| q.price)
    }

    pub fn snapshot(&self) -> HashMap<Symbol, Quote> {
        self.quotes.read().clone()
    }

    /// Symbol -> price map for portfolio valuation.
    pub fn prices(&self) -> HashMap<Symbol, Decimal> {
        self.quotes
            .read()
            .iter()
            .map(|(symbol, quote)| (symbol.clone(), quote.price))
            .collect()
    }

    pub fn set_loading(&self, loading: bool) {
        *self.loading.write() = loading;
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.read()
    }

    /// Set or clear the feed health error. Setting any value ends loading.
    pub fn set_error(&self, error: Option<String>) {
        *self.error.write() = error;
        *self.loading.write() = false;
    }

    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new()
    }
}
