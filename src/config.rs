//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section and field has a default, so a partial (or missing) file is valid.

use anyhow::{anyhow, ensure, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::engine::runner::{RunDefaults, DEFAULT_START_AMOUNT};
use crate::sources::{criptoya, dolarapi};
use crate::types::Pair;
use crate::venues::VenueSelection;

pub const DEFAULT_TIMEZONE: &str = "America/Argentina/Buenos_Aires";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub venues: VenuesConfig,
    pub report: ReportConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub criptoya_base_url: String,
    pub dolarapi_base_url: String,
    /// Order size CriptoYa prices against.
    pub volume: f64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            criptoya_base_url: criptoya::DEFAULT_BASE_URL.to_string(),
            dolarapi_base_url: dolarapi::DEFAULT_BASE_URL.to_string(),
            volume: criptoya::DEFAULT_VOLUME,
            timeout_secs: 15,
            user_agent: concat!("cycle-arb/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Default-enabled venues per pair. `None` enables the whole catalog.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VenuesConfig {
    pub usdt_usd: Option<Vec<String>>,
    pub usdt_ars: Option<Vec<String>>,
}

impl VenuesConfig {
    pub fn selection(&self, pair: Pair) -> VenueSelection {
        let names = match pair {
            Pair::UsdtUsd => self.usdt_usd.as_deref(),
            Pair::UsdtArs => self.usdt_ars.as_deref(),
        };
        match names {
            Some(names) => VenueSelection::from_names(pair, names),
            None => VenueSelection::all(pair),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    /// IANA timezone name for report timestamps.
    pub timezone: String,
    pub start_amount: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            start_amount: DEFAULT_START_AMOUNT,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every run fail.
    pub fn validate(&self) -> Result<()> {
        let start = self.report.start_amount;
        ensure!(
            start.is_finite() && start > 0.0,
            "report.start_amount must be a positive number, got {start}"
        );
        Ok(())
    }

    /// The reporting timezone.
    pub fn timezone(&self) -> Result<Tz> {
        self.report
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid report timezone '{}': {e}", self.report.timezone))
    }

    /// Defaults applied to requests that leave inputs out.
    pub fn run_defaults(&self) -> RunDefaults {
        RunDefaults {
            start_amount: self.report.start_amount,
            usdt_usd: self.venues.selection(Pair::UsdtUsd),
            usdt_ars: self.venues.selection(Pair::UsdtArs),
        }
    }
}
