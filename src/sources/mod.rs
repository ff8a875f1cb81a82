//! Pricing sources.
//!
//! Defines the `QuoteSource` and `RateSource` traits consumed by the cycle
//! runner, with HTTP implementations for:
//! - CriptoYa — per-venue USDT/USD and USDT/ARS quotes
//! - DolarAPI — the official ARS/USD rate

pub mod criptoya;
pub mod dolarapi;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::types::{CycleError, OfficialRate, Pair, QuoteBook};

/// Per-venue quotes for a currency pair.
///
/// Malformed per-venue entries come back as quotes with absent fields;
/// only failures affecting the whole batch are errors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the current quote book for `pair`.
    async fn fetch_quotes(&self, pair: Pair) -> Result<QuoteBook, CycleError>;
}

/// The official ARS/USD rate.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_official_rate(&self) -> Result<OfficialRate, CycleError>;
}

/// Build the shared HTTP client used by the source implementations.
pub fn http_client(timeout_secs: u64, user_agent: &str) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .context("Failed to build HTTP client for pricing sources")
}
