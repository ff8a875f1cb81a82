//! In-memory pricing sources for integration testing.
//!
//! Deterministic `QuoteSource` and `RateSource` implementations that serve
//! fixed snapshots, record every fetch and can be forced to fail.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cycle_arb::sources::{QuoteSource, RateSource};
use cycle_arb::types::{CycleError, OfficialRate, Pair, Quote, QuoteBook};

/// Quote source backed by a map of pair → quote book.
#[derive(Clone)]
pub struct MockQuotes {
    books: Arc<Mutex<HashMap<Pair, QuoteBook>>>,
    calls: Arc<Mutex<Vec<Pair>>>,
    /// Pairs whose fetch fails with the given message.
    failures: Arc<Mutex<HashMap<Pair, String>>>,
}

impl MockQuotes {
    pub fn new() -> Self {
        Self {
            books: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The venue snapshots used by the end-to-end scenarios.
    pub fn scenario() -> Self {
        let quotes = Self::new();
        quotes.set_book(
            Pair::UsdtUsd,
            vec![
                Quote::new("buenbit", Some(1.02), Some(0.99)),
                Quote::new("belo", Some(1.00), Some(0.97)),
                Quote::new("fiwind", Some(1.01), Some(0.98)),
            ],
        );
        quotes.set_book(
            Pair::UsdtArs,
            vec![
                Quote::new("ripio", Some(1230.0), Some(1200.0)),
                Quote::new("lemoncash", Some(1240.0), Some(1215.0)),
            ],
        );
        quotes
    }

    pub fn set_book(&self, pair: Pair, quotes: Vec<Quote>) {
        self.books
            .lock()
            .unwrap()
            .insert(pair, quotes.into_iter().collect());
    }

    /// Make fetches for `pair` fail.
    pub fn fail(&self, pair: Pair, msg: &str) {
        self.failures.lock().unwrap().insert(pair, msg.to_string());
    }

    pub fn calls(&self) -> Vec<Pair> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteSource for MockQuotes {
    async fn fetch_quotes(&self, pair: Pair) -> Result<QuoteBook, CycleError> {
        self.calls.lock().unwrap().push(pair);

        if let Some(msg) = self.failures.lock().unwrap().get(&pair) {
            return Err(CycleError::transport(format!("mock {pair}"), msg));
        }
        Ok(self
            .books
            .lock()
            .unwrap()
            .get(&pair)
            .cloned()
            .unwrap_or_default())
    }
}

/// Rate source serving a fixed official rate.
#[derive(Clone)]
pub struct MockRates {
    rate: Arc<Mutex<OfficialRate>>,
    calls: Arc<Mutex<usize>>,
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockRates {
    pub fn new(sell_rate: Option<f64>) -> Self {
        Self {
            rate: Arc::new(Mutex::new(OfficialRate {
                name: "Oficial".to_string(),
                sell_rate,
            })),
            calls: Arc::new(Mutex::new(0)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RateSource for MockRates {
    async fn fetch_official_rate(&self) -> Result<OfficialRate, CycleError> {
        *self.calls.lock().unwrap() += 1;

        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            return Err(CycleError::transport("mock oficial", msg));
        }
        Ok(self.rate.lock().unwrap().clone())
    }
}
