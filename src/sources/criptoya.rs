//! CriptoYa quote aggregator.
//!
//! API: `https://criptoya.com/api/{coin}/{fiat}/{volume}`
//! Auth: none. Returns a JSON object keyed by venue, each entry carrying
//! `ask`, `bid`, `totalAsk`, `totalBid` and `time` for the requested volume.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::QuoteSource;
use crate::types::{CycleError, Pair, Quote, QuoteBook};

pub const DEFAULT_BASE_URL: &str = "https://criptoya.com";
const SOURCE_NAME: &str = "criptoya";

/// Order size CriptoYa quotes against, in units of the coin.
pub const DEFAULT_VOLUME: f64 = 0.1;

/// CriptoYa client.
pub struct CriptoYaClient {
    http: Client,
    base_url: String,
    volume: f64,
}

impl CriptoYaClient {
    pub fn new(http: Client, base_url: impl Into<String>, volume: f64) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            volume,
        }
    }

    pub fn endpoint(&self, pair: Pair) -> String {
        format!(
            "{}/api/{}/{}/{}",
            self.base_url,
            pair.base(),
            pair.quote(),
            self.volume
        )
    }

    /// Parse a CriptoYa payload into a quote book, keeping venue order.
    ///
    /// Entries that are not objects, or whose `ask`/`bid` are not numbers,
    /// yield quotes with the corresponding side absent.
    pub fn parse_quote_book(payload: &Value) -> Option<QuoteBook> {
        let venues: &Map<String, Value> = payload.as_object()?;
        Some(
            venues
                .iter()
                .map(|(venue, entry)| {
                    let side = |key: &str| entry.get(key).and_then(Value::as_f64);
                    Quote::new(venue.as_str(), side("ask"), side("bid"))
                })
                .collect(),
        )
    }
}

#[async_trait]
impl QuoteSource for CriptoYaClient {
    async fn fetch_quotes(&self, pair: Pair) -> Result<QuoteBook, CycleError> {
        let source = format!("{SOURCE_NAME} {pair}");
        let url = self.endpoint(pair);
        debug!(url = %url, "Fetching CriptoYa quotes");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CycleError::transport(&source, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(pair = %pair, status = %status, "CriptoYa returned an error status");
            return Err(CycleError::transport(&source, format!("HTTP {status}")));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| CycleError::transport(&source, format!("malformed payload: {e}")))?;

        let book = Self::parse_quote_book(&payload).ok_or_else(|| {
            CycleError::transport(&source, "malformed payload: expected an object keyed by venue")
        })?;

        debug!(pair = %pair, venues = book.len(), "CriptoYa quotes received");
        Ok(book)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
