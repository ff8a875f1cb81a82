//! Shared types for the arbitrage cycle calculator.
//!
//! These types form the data model used across all modules: quotes as
//! fetched from the pricing sources, per-leg configuration supplied by the
//! caller, and the report produced by a successful run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker used in traces when a leg's price was supplied by the user.
pub const MANUAL: &str = "Manual";

/// Shown alongside every result.
pub const DISCLAIMER: &str = "Trading fees, limits, settlement times and counterparty \
     risk are not considered. Verify venues and on/off-ramp limits before trading.";

/// A usable price is finite and strictly positive.
pub fn valid_price(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

// ---------------------------------------------------------------------------
// Pairs and quotes
// ---------------------------------------------------------------------------

/// Currency pairs quoted by the venue sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pair {
    UsdtUsd,
    UsdtArs,
}

impl Pair {
    /// Base asset (always USDT).
    pub fn base(&self) -> &'static str {
        "USDT"
    }

    /// Quote currency.
    pub fn quote(&self) -> &'static str {
        match self {
            Pair::UsdtUsd => "USD",
            Pair::UsdtArs => "ARS",
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base(), self.quote())
    }
}

impl std::str::FromStr for Pair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('/', "-").as_str() {
            "usdt-usd" => Ok(Pair::UsdtUsd),
            "usdt-ars" => Ok(Pair::UsdtArs),
            _ => anyhow::bail!("Unknown pair: {s}"),
        }
    }
}

/// One venue's two-sided price for a pair. Either side may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub venue: String,
    pub ask: Option<f64>,
    pub bid: Option<f64>,
}

impl Quote {
    pub fn new(venue: impl Into<String>, ask: Option<f64>, bid: Option<f64>) -> Self {
        Self {
            venue: venue.into(),
            ask,
            bid,
        }
    }

    /// The field a selection rule reads, if it holds a usable price.
    pub fn price_for(&self, rule: SelectionRule) -> Option<f64> {
        match rule {
            SelectionRule::MinAsk => valid_price(self.ask),
            SelectionRule::MaxBid => valid_price(self.bid),
        }
    }
}

/// Snapshot of every venue's quote for one pair, in source order.
///
/// Iteration order is the order the source listed the venues; the selector
/// breaks ties in favour of the earlier entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteBook {
    quotes: Vec<Quote>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a quote. A repeated venue replaces the earlier entry in place.
    pub fn insert(&mut self, quote: Quote) {
        match self.quotes.iter_mut().find(|q| q.venue == quote.venue) {
            Some(existing) => *existing = quote,
            None => self.quotes.push(quote),
        }
    }

    pub fn get(&self, venue: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.venue == venue)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl FromIterator<Quote> for QuoteBook {
    fn from_iter<I: IntoIterator<Item = Quote>>(iter: I) -> Self {
        let mut book = QuoteBook::new();
        for quote in iter {
            book.insert(quote);
        }
        book
    }
}

/// The official ARS/USD rate used to close the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialRate {
    pub name: String,
    /// ARS received per USD sold. Absent when the source omitted it.
    pub sell_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Leg configuration
// ---------------------------------------------------------------------------

/// Trade direction on the USDT/ARS leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Acquire USDT with ARS at the venue's ask.
    Buy,
    /// Dispose of USDT for ARS at the venue's bid.
    Sell,
}

impl Side {
    pub fn rule(&self) -> SelectionRule {
        match self {
            Side::Buy => SelectionRule::MinAsk,
            Side::Sell => SelectionRule::MaxBid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy (ask)"),
            Side::Sell => write!(f, "sell (bid)"),
        }
    }
}

/// Whether a leg's price comes from the sources or from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMode {
    #[default]
    Auto,
    Manual,
}

/// Per-leg pricing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LegConfig {
    #[serde(default)]
    pub mode: PriceMode,
    #[serde(default)]
    pub manual_value: Option<f64>,
    /// Only read on the USDT/ARS leg.
    #[serde(default)]
    pub side: Option<Side>,
}

impl LegConfig {
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn manual(value: f64) -> Self {
        Self {
            mode: PriceMode::Manual,
            manual_value: Some(value),
            side: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn is_manual(&self) -> bool {
        self.mode == PriceMode::Manual
    }

    /// Validated manual value for `leg`.
    pub fn manual_price(&self, leg: Leg) -> Result<f64, CycleError> {
        validate_manual(leg, self.manual_value)
    }
}

/// Check a user-supplied price for `leg`.
pub fn validate_manual(leg: Leg, value: Option<f64>) -> Result<f64, CycleError> {
    valid_price(value).ok_or_else(|| CycleError::InvalidLegInput {
        leg,
        reason: match value {
            None => "manual price is missing".to_string(),
            Some(v) => format!("manual price must be a positive number, got {v}"),
        },
    })
}

/// Extremum picked by the quote selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionRule {
    MinAsk,
    MaxBid,
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionRule::MinAsk => write!(f, "min-ask"),
            SelectionRule::MaxBid => write!(f, "max-bid"),
        }
    }
}

/// Winning venue and the price it quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub venue: String,
    pub price: f64,
}

// ---------------------------------------------------------------------------
// Legs and results
// ---------------------------------------------------------------------------

/// The three conversions of the cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    #[serde(rename = "USD/USDT")]
    UsdUsdt,
    #[serde(rename = "USDT/ARS")]
    UsdtArs,
    #[serde(rename = "ARS/USD")]
    ArsUsd,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::UsdUsdt => write!(f, "USD/USDT"),
            Leg::UsdtArs => write!(f, "USDT/ARS"),
            Leg::ArsUsd => write!(f, "ARS/USD"),
        }
    }
}

/// Audit record of one resolved leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegTrace {
    pub leg: Leg,
    /// Winning venue, the official rate's name, or [`MANUAL`].
    pub venue: String,
    /// Rule used for automatic selection; `None` for manual or official prices.
    pub rule: Option<SelectionRule>,
    pub side: Option<Side>,
    pub price: f64,
    /// Running amount after this leg, in the leg's output currency.
    pub amount_out: f64,
}

impl LegTrace {
    pub fn is_manual(&self) -> bool {
        self.venue == MANUAL
    }
}

/// Report of a completed cycle. Numbers are stored unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub start_amount: f64,
    pub usd_to_usdt: LegTrace,
    pub usdt_to_ars: LegTrace,
    pub ars_to_usd: LegTrace,
    pub final_usd: f64,
    pub profit_percent: f64,
    pub captured_at: DateTime<Utc>,
    /// `captured_at` rendered in the reporting timezone.
    pub timestamp: String,
    pub disclaimer: String,
}

impl CycleResult {
    pub fn legs(&self) -> [&LegTrace; 3] {
        [&self.usd_to_usdt, &self.usdt_to_ars, &self.ars_to_usd]
    }

    pub fn is_profitable(&self) -> bool {
        self.profit_percent > 0.0
    }
}

impl fmt::Display for CycleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s1 = &self.usd_to_usdt;
        let s2 = &self.usdt_to_ars;
        let s3 = &self.ars_to_usd;
        writeln!(
            f,
            "1) USD → USDT  [{}] ask {:.6} → {:.6} USDT",
            s1.venue, s1.price, s1.amount_out
        )?;
        match s2.side {
            Some(side) if !s2.is_manual() => writeln!(
                f,
                "2) USDT → ARS  [{}] {side} {:.2} → {:.2} ARS",
                s2.venue, s2.price, s2.amount_out
            )?,
            _ => writeln!(
                f,
                "2) USDT → ARS  [{}] {:.2} → {:.2} ARS",
                s2.venue, s2.price, s2.amount_out
            )?,
        }
        writeln!(
            f,
            "3) ARS → USD   [{}] sell {:.2} → {:.6} USD",
            s3.venue, s3.price, s3.amount_out
        )?;
        write!(
            f,
            "Profit: {:.2}% from {} USD ({})",
            self.profit_percent, self.start_amount, self.timestamp
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures that abort a calculation run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CycleError {
    #[error("Transport error ({source_name}): {message}")]
    Transport { source_name: String, message: String },

    #[error("{leg}: no enabled venue has a valid {rule} quote")]
    NoEligibleQuote { leg: Leg, rule: SelectionRule },

    #[error("{leg}: invalid input: {reason}")]
    InvalidLegInput { leg: Leg, reason: String },
}

impl CycleError {
    pub fn transport(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        CycleError::Transport {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Short machine-readable discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Transport { .. } => "transport_error",
            CycleError::NoEligibleQuote { .. } => "no_eligible_quote",
            CycleError::InvalidLegInput { .. } => "invalid_leg_input",
        }
    }

    /// The leg that failed, when the failure belongs to one.
    pub fn leg(&self) -> Option<Leg> {
        match self {
            CycleError::Transport { .. } => None,
            CycleError::NoEligibleQuote { leg, .. } | CycleError::InvalidLegInput { leg, .. } => {
                Some(*leg)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
