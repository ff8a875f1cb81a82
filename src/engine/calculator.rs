//! Three-leg cycle arithmetic.
//!
//! Resolves a price for each leg (best venue quote, manual override, or the
//! official rate), threads the amount through USD → USDT → ARS → USD and
//! assembles the report. Pure apart from reading the clock in [`CycleCalculator::compute`].

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use super::selector::select_best;
use crate::types::{
    valid_price, validate_manual, CycleError, CycleResult, Leg, LegConfig, LegTrace,
    OfficialRate, QuoteBook, Side, DISCLAIMER, MANUAL,
};
use crate::venues::VenueSelection;

/// Side used on the USDT/ARS leg when the caller does not pick one.
pub const DEFAULT_SIDE: Side = Side::Sell;

/// Timestamp layout for reports.
const TIMESTAMP_FORMAT: &str = "%A %-d %B %Y, %H:%M:%S %Z";

/// Inputs for a leg priced from venue quotes.
#[derive(Debug, Clone, Copy)]
pub struct VenueLeg<'a> {
    pub config: LegConfig,
    /// Quotes for the leg's pair, or the error fetching them. Unused in
    /// manual mode; a fetch error fails the leg only when it is reached.
    pub quotes: Result<&'a QuoteBook, &'a CycleError>,
    pub enabled: &'a VenueSelection,
}

/// Price source for the closing ARS → USD leg.
#[derive(Debug, Clone, Copy)]
pub enum ClosingRate<'a> {
    Official(&'a OfficialRate),
    /// The official rate could not be fetched.
    Unavailable(&'a CycleError),
    Manual(Option<f64>),
}

/// Computes cycle reports stamped in a fixed reporting timezone.
#[derive(Debug, Clone)]
pub struct CycleCalculator {
    timezone: Tz,
}

impl CycleCalculator {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Compute the cycle, stamping it with the current time.
    pub fn compute(
        &self,
        start_amount: f64,
        usd_usdt: VenueLeg<'_>,
        usdt_ars: VenueLeg<'_>,
        ars_usd: ClosingRate<'_>,
    ) -> Result<CycleResult, CycleError> {
        self.compute_at(start_amount, usd_usdt, usdt_ars, ars_usd, Utc::now())
    }

    /// Compute the cycle with an explicit capture time.
    ///
    /// Legs are resolved in order and the first failure is returned.
    pub fn compute_at(
        &self,
        start_amount: f64,
        usd_usdt: VenueLeg<'_>,
        usdt_ars: VenueLeg<'_>,
        ars_usd: ClosingRate<'_>,
        captured_at: DateTime<Utc>,
    ) -> Result<CycleResult, CycleError> {
        let start_amount = validate_start_amount(start_amount)?;

        // 1) USD -> USDT at the lowest ask
        let mut step1 = resolve_venue_leg(Leg::UsdUsdt, &usd_usdt, None)?;
        step1.amount_out = checked_amount(Leg::UsdUsdt, start_amount / step1.price)?;

        // 2) USDT -> ARS. The amount is multiplied on either side.
        let side = usdt_ars.config.side.unwrap_or(DEFAULT_SIDE);
        let mut step2 = resolve_venue_leg(Leg::UsdtArs, &usdt_ars, Some(side))?;
        step2.amount_out = checked_amount(Leg::UsdtArs, step1.amount_out * step2.price)?;

        // 3) ARS -> USD at the official (or manual) sell rate
        let mut step3 = resolve_closing_leg(ars_usd)?;
        step3.amount_out = checked_amount(Leg::ArsUsd, step2.amount_out / step3.price)?;

        let final_usd = step3.amount_out;
        let profit_percent = (final_usd / start_amount - 1.0) * 100.0;
        if !profit_percent.is_finite() {
            return Err(CycleError::InvalidLegInput {
                leg: Leg::ArsUsd,
                reason: format!("profit of {final_usd} USD from {start_amount} USD is out of range"),
            });
        }

        debug!(
            start_amount,
            usdt = step1.amount_out,
            ars = step2.amount_out,
            final_usd,
            profit_percent,
            "Cycle computed"
        );

        Ok(CycleResult {
            start_amount,
            usd_to_usdt: step1,
            usdt_to_ars: step2,
            ars_to_usd: step3,
            final_usd,
            profit_percent,
            captured_at,
            timestamp: self.format_timestamp(captured_at),
            disclaimer: DISCLAIMER.to_string(),
        })
    }

    /// Render a capture time in the reporting timezone.
    pub fn format_timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

/// The amount entering the cycle must be a positive number of USD.
pub fn validate_start_amount(start_amount: f64) -> Result<f64, CycleError> {
    valid_price(Some(start_amount)).ok_or_else(|| CycleError::InvalidLegInput {
        leg: Leg::UsdUsdt,
        reason: format!("start amount must be a positive number, got {start_amount}"),
    })
}

/// Amounts must stay finite and positive through every leg.
fn checked_amount(leg: Leg, amount: f64) -> Result<f64, CycleError> {
    valid_price(Some(amount)).ok_or_else(|| CycleError::InvalidLegInput {
        leg,
        reason: format!("resulting amount {amount} is out of range"),
    })
}

/// Resolve the price of a venue leg. `amount_out` is filled in by the caller.
///
/// `side` is only given for the USDT/ARS leg; without it the leg buys at the
/// lowest ask.
fn resolve_venue_leg(
    leg: Leg,
    input: &VenueLeg<'_>,
    side: Option<Side>,
) -> Result<LegTrace, CycleError> {
    if input.config.is_manual() {
        let price = input.config.manual_price(leg)?;
        debug!(leg = %leg, price, "Using manual price");
        return Ok(LegTrace {
            leg,
            venue: MANUAL.to_string(),
            rule: None,
            side,
            price,
            amount_out: 0.0,
        });
    }

    let quotes = input.quotes.map_err(CycleError::clone)?;
    let rule = side.unwrap_or(Side::Buy).rule();
    let selection = select_best(quotes, input.enabled, rule)
        .map_err(|e| CycleError::NoEligibleQuote { leg, rule: e.rule })?;

    Ok(LegTrace {
        leg,
        venue: selection.venue,
        rule: Some(rule),
        side,
        price: selection.price,
        amount_out: 0.0,
    })
}

fn resolve_closing_leg(rate: ClosingRate<'_>) -> Result<LegTrace, CycleError> {
    let (venue, price) = match rate {
        ClosingRate::Official(official) => {
            let price = valid_price(official.sell_rate).ok_or_else(|| {
                CycleError::InvalidLegInput {
                    leg: Leg::ArsUsd,
                    reason: format!("official rate '{}' has no valid sell rate", official.name),
                }
            })?;
            (official.name.clone(), price)
        }
        ClosingRate::Unavailable(e) => return Err(e.clone()),
        ClosingRate::Manual(value) => (MANUAL.to_string(), validate_manual(Leg::ArsUsd, value)?),
    };

    Ok(LegTrace {
        leg: Leg::ArsUsd,
        venue,
        rule: None,
        side: None,
        price,
        amount_out: 0.0,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
