//! Best-quote selection.
//!
//! Picks the lowest ask or highest bid among the enabled venues of a quote
//! book. A venue is a candidate only if it is enabled, present in the book,
//! and quotes a finite positive price on the side the rule reads.

use tracing::debug;

use crate::types::{Quote, QuoteBook, Selection, SelectionRule};
use crate::venues::VenueSelection;

/// No enabled venue had a usable price for the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no eligible {rule} quote")]
pub struct NoEligibleQuote {
    pub rule: SelectionRule,
}

/// Select the best quote for `rule`.
///
/// Ties keep the candidate that appears first in the book.
pub fn select_best(
    quotes: &QuoteBook,
    enabled: &VenueSelection,
    rule: SelectionRule,
) -> Result<Selection, NoEligibleQuote> {
    let best = quotes
        .iter()
        .filter(|q| enabled.contains(&q.venue))
        .filter_map(|q| q.price_for(rule).map(|price| (q, price)))
        .fold(None::<(&Quote, f64)>, |best, (q, price)| match best {
            Some((_, current)) if !improves(rule, price, current) => best,
            _ => Some((q, price)),
        });

    match best {
        Some((quote, price)) => {
            debug!(rule = %rule, venue = %quote.venue, price, "Best quote selected");
            Ok(Selection {
                venue: quote.venue.clone(),
                price,
            })
        }
        None => {
            debug!(
                rule = %rule,
                quoted = quotes.len(),
                enabled = enabled.len(),
                "No eligible quote"
            );
            Err(NoEligibleQuote { rule })
        }
    }
}

/// Strict comparison so the earlier candidate wins ties.
fn improves(rule: SelectionRule, candidate: f64, current: f64) -> bool {
    match rule {
        SelectionRule::MinAsk => candidate < current,
        SelectionRule::MaxBid => candidate > current,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
