//! DolarAPI official exchange rate.
//!
//! API: `https://dolarapi.com/v1/dolares/oficial`
//! Auth: none. Returns `{ moneda, casa, nombre, compra, venta, fechaActualizacion }`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::RateSource;
use crate::types::{CycleError, OfficialRate};

pub const DEFAULT_BASE_URL: &str = "https://dolarapi.com";
const SOURCE_NAME: &str = "dolarapi oficial";

/// Name used when the payload omits `nombre`.
const FALLBACK_NAME: &str = "oficial";

/// DolarAPI client.
pub struct DolarApiClient {
    http: Client,
    base_url: String,
}

impl DolarApiClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/dolares/oficial", self.base_url)
    }

    /// Extract the official rate. A missing or non-numeric `venta` leaves
    /// the sell rate absent; it is rejected when the cycle is computed.
    pub fn parse_rate(payload: &Value) -> OfficialRate {
        let name = payload
            .get("nombre")
            .and_then(Value::as_str)
            .unwrap_or(FALLBACK_NAME)
            .to_string();
        let sell_rate = payload.get("venta").and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        OfficialRate { name, sell_rate }
    }
}

#[async_trait]
impl RateSource for DolarApiClient {
    async fn fetch_official_rate(&self) -> Result<OfficialRate, CycleError> {
        let url = self.endpoint();
        debug!(url = %url, "Fetching official rate");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CycleError::transport(SOURCE_NAME, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(status = %status, "DolarAPI returned an error status");
            return Err(CycleError::transport(SOURCE_NAME, format!("HTTP {status}")));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| CycleError::transport(SOURCE_NAME, format!("malformed payload: {e}")))?;

        let rate = Self::parse_rate(&payload);
        debug!(name = %rate.name, sell_rate = ?rate.sell_rate, "Official rate received");
        Ok(rate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
