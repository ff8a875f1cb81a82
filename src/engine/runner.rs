//! Calculation runs.
//!
//! A run gathers everything the automatic legs need (USDT/USD quotes,
//! USDT/ARS quotes, the official rate) concurrently, then hands the
//! snapshots to the [`CycleCalculator`]. A failed fetch fails only its own
//! leg, in cycle order. Manual legs skip their fetch, and a leading run of
//! manual legs is validated before any request goes out.

use futures::future::OptionFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::calculator::{validate_start_amount, ClosingRate, CycleCalculator, VenueLeg};
use crate::sources::{QuoteSource, RateSource};
use crate::types::{CycleError, CycleResult, Leg, LegConfig, OfficialRate, Pair, QuoteBook};
use crate::venues::VenueSelection;

/// Amount of USD entering the cycle when the request does not say.
pub const DEFAULT_START_AMOUNT: f64 = 1.0;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Configuration of a leg priced from venue quotes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueLegRequest {
    #[serde(flatten)]
    pub config: LegConfig,
    /// Enabled venues. `None` uses the runner's default selection.
    #[serde(default)]
    pub venues: Option<Vec<String>>,
}

impl VenueLegRequest {
    pub fn new(config: LegConfig) -> Self {
        Self {
            config,
            venues: None,
        }
    }

    pub fn with_venues<I, S>(mut self, venues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.venues = Some(venues.into_iter().map(Into::into).collect());
        self
    }
}

/// Everything the caller chooses for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleRequest {
    #[serde(default)]
    pub start_amount: Option<f64>,
    #[serde(default)]
    pub usd_usdt: VenueLegRequest,
    #[serde(default)]
    pub usdt_ars: VenueLegRequest,
    /// `auto` reads the official rate; `manual` uses `manual_value`.
    #[serde(default)]
    pub ars_usd: LegConfig,
}

/// Source data fetched during a run, kept for inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawData {
    pub usdt_usd: Option<QuoteBook>,
    pub usdt_ars: Option<QuoteBook>,
    pub official_rate: Option<OfficialRate>,
}

/// A successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleRun {
    pub run_id: Uuid,
    pub result: CycleResult,
    pub raw: RawData,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Default inputs applied when a request leaves them out.
#[derive(Debug, Clone)]
pub struct RunDefaults {
    pub start_amount: f64,
    pub usdt_usd: VenueSelection,
    pub usdt_ars: VenueSelection,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            start_amount: DEFAULT_START_AMOUNT,
            usdt_usd: VenueSelection::all(Pair::UsdtUsd),
            usdt_ars: VenueSelection::all(Pair::UsdtArs),
        }
    }
}

/// Fetches source data and computes cycles.
pub struct CycleRunner {
    quotes: Arc<dyn QuoteSource>,
    rates: Arc<dyn RateSource>,
    calculator: CycleCalculator,
    defaults: RunDefaults,
}

impl CycleRunner {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        rates: Arc<dyn RateSource>,
        calculator: CycleCalculator,
    ) -> Self {
        Self {
            quotes,
            rates,
            calculator,
            defaults: RunDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: RunDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &RunDefaults {
        &self.defaults
    }

    /// Fetch the raw quote book for a pair.
    pub async fn fetch_quotes(&self, pair: Pair) -> Result<QuoteBook, CycleError> {
        self.quotes.fetch_quotes(pair).await
    }

    /// Fetch the raw official rate.
    pub async fn fetch_official_rate(&self) -> Result<OfficialRate, CycleError> {
        self.rates.fetch_official_rate().await
    }

    /// Execute one calculation run.
    pub async fn run(&self, request: &CycleRequest) -> Result<CycleRun, CycleError> {
        let run_id = Uuid::new_v4();
        let outcome = self
            .run_inner(run_id, request)
            .instrument(info_span!("cycle_run", %run_id))
            .await;

        match &outcome {
            Ok(run) => info!(
                %run_id,
                usd_venue = %run.result.usd_to_usdt.venue,
                ars_venue = %run.result.usdt_to_ars.venue,
                rate = %run.result.ars_to_usd.venue,
                final_usd = run.result.final_usd,
                profit_percent = run.result.profit_percent,
                "Cycle run complete"
            ),
            Err(e) => warn!(%run_id, kind = e.kind(), leg = ?e.leg(), error = %e, "Cycle run failed"),
        }
        outcome
    }

    async fn run_inner(&self, run_id: Uuid, request: &CycleRequest) -> Result<CycleRun, CycleError> {
        let start_amount = request.start_amount.unwrap_or(self.defaults.start_amount);
        check_manual_prefix(start_amount, request)?;

        let usd_auto = !request.usd_usdt.config.is_manual();
        let ars_auto = !request.usdt_ars.config.is_manual();
        let rate_auto = !request.ars_usd.is_manual();

        // Independent fetches; none waits on another.
        let (usd, ars, rate) = tokio::join!(
            OptionFuture::from(usd_auto.then(|| self.quotes.fetch_quotes(Pair::UsdtUsd))),
            OptionFuture::from(ars_auto.then(|| self.quotes.fetch_quotes(Pair::UsdtArs))),
            OptionFuture::from(rate_auto.then(|| self.rates.fetch_official_rate())),
        );

        let usd_sel = self.selection_for(Pair::UsdtUsd, request.usd_usdt.venues.as_deref());
        let ars_sel = self.selection_for(Pair::UsdtArs, request.usdt_ars.venues.as_deref());
        let empty = QuoteBook::new();

        // A failed fetch fails its leg only when the calculator reaches it,
        // so an earlier leg's own error still takes precedence.
        let closing = match &rate {
            Some(Ok(official)) => ClosingRate::Official(official),
            Some(Err(e)) => ClosingRate::Unavailable(e),
            None => ClosingRate::Manual(request.ars_usd.manual_value),
        };

        let result = self.calculator.compute(
            start_amount,
            VenueLeg {
                config: request.usd_usdt.config,
                quotes: fetched_quotes(&usd, &empty),
                enabled: &usd_sel,
            },
            VenueLeg {
                config: request.usdt_ars.config,
                quotes: fetched_quotes(&ars, &empty),
                enabled: &ars_sel,
            },
            closing,
        )?;

        let raw = RawData {
            usdt_usd: usd.and_then(Result::ok),
            usdt_ars: ars.and_then(Result::ok),
            official_rate: rate.and_then(Result::ok),
        };

        Ok(CycleRun {
            run_id,
            result,
            raw,
        })
    }

    fn selection_for(&self, pair: Pair, names: Option<&[String]>) -> VenueSelection {
        match names {
            Some(names) => VenueSelection::from_names(pair, names),
            None => match pair {
                Pair::UsdtUsd => self.defaults.usdt_usd.clone(),
                Pair::UsdtArs => self.defaults.usdt_ars.clone(),
            },
        }
    }
}

/// Quotes for a venue leg. Skipped fetches (manual legs) read as empty.
fn fetched_quotes<'a>(
    fetched: &'a Option<Result<QuoteBook, CycleError>>,
    empty: &'a QuoteBook,
) -> Result<&'a QuoteBook, &'a CycleError> {
    match fetched {
        Some(result) => result.as_ref(),
        None => Ok(empty),
    }
}

/// Validate the start amount and every manual leg up to the first automatic
/// one. These checks need no source data, so a bad value fails the run
/// before any request is sent, and the reported leg is still the first one
/// that would fail.
fn check_manual_prefix(start_amount: f64, request: &CycleRequest) -> Result<(), CycleError> {
    validate_start_amount(start_amount)?;

    let legs = [
        (Leg::UsdUsdt, &request.usd_usdt.config),
        (Leg::UsdtArs, &request.usdt_ars.config),
        (Leg::ArsUsd, &request.ars_usd),
    ];
    for (leg, config) in legs {
        if !config.is_manual() {
            break;
        }
        config.manual_price(leg)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
