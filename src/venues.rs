//! Venue catalogs and the per-pair enabled-venue set.
//!
//! Each pair has a closed, statically known catalog of venues the user may
//! enable. A [`VenueSelection`] only ever holds names from its pair's catalog.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use tracing::warn;

use crate::types::Pair;

/// Venues quoting USDT/USD.
pub const USDT_USD_VENUES: &[&str] = &[
    "buenbit",
    "satoshitango",
    "letsbit",
    "binancep2p",
    "fiwind",
    "belo",
    "tiendacrypto",
];

/// Venues quoting USDT/ARS.
pub const USDT_ARS_VENUES: &[&str] = &[
    "buenbit",
    "ripio",
    "ripioexchange",
    "satoshitango",
    "decrypto",
    "letsbit",
    "binancep2p",
    "fiwind",
    "lemoncash",
    "okexp2p",
    "paxfulp2p",
    "belo",
    "tiendacrypto",
    "bybitp2p",
    "kucoinp2p",
    "bitgetp2p",
    "bingxp2p",
    "bitsoalpha",
    "lemoncashp2p",
    "cocoscrypto",
    "mexcp2p",
];

/// The catalog for a pair.
pub fn catalog(pair: Pair) -> &'static [&'static str] {
    match pair {
        Pair::UsdtUsd => USDT_USD_VENUES,
        Pair::UsdtArs => USDT_ARS_VENUES,
    }
}

/// Set of enabled venues for one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueSelection {
    pair: Pair,
    enabled: BTreeSet<&'static str>,
}

impl VenueSelection {
    /// An empty selection.
    pub fn none(pair: Pair) -> Self {
        Self {
            pair,
            enabled: BTreeSet::new(),
        }
    }

    /// Every venue in the pair's catalog.
    pub fn all(pair: Pair) -> Self {
        let mut selection = Self::none(pair);
        selection.fill_from(catalog(pair));
        selection
    }

    /// Build from user-supplied names. Names outside the catalog are dropped.
    pub fn from_names<I, S>(pair: Pair, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::none(pair);
        for name in names {
            let name = name.as_ref();
            if !selection.insert(name) {
                warn!(pair = %pair, venue = name, "Ignoring venue outside catalog");
            }
        }
        selection
    }

    pub fn pair(&self) -> Pair {
        self.pair
    }

    pub fn contains(&self, venue: &str) -> bool {
        self.enabled.contains(venue)
    }

    /// Enable a venue. Returns `false` if the venue is not in the catalog.
    pub fn insert(&mut self, venue: &str) -> bool {
        match catalog(self.pair).iter().find(|v| **v == venue) {
            Some(known) => {
                self.enabled.insert(*known);
                true
            }
            None => false,
        }
    }

    /// Disable a venue. Returns `true` if it was enabled.
    pub fn remove(&mut self, venue: &str) -> bool {
        self.enabled.remove(venue)
    }

    /// Flip a venue. Returns the new state; unknown venues stay disabled.
    pub fn toggle(&mut self, venue: &str) -> bool {
        if self.remove(venue) {
            false
        } else {
            self.insert(venue)
        }
    }

    pub fn clear(&mut self) {
        self.enabled.clear();
    }

    /// Enable every catalog venue listed in `venues`.
    pub fn fill_from(&mut self, venues: &[&str]) {
        for venue in venues {
            self.insert(venue);
        }
    }

    /// Whether every catalog venue is enabled.
    pub fn is_complete(&self) -> bool {
        catalog(self.pair).iter().all(|v| self.enabled.contains(v))
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    /// Enabled venues in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        catalog(self.pair)
            .iter()
            .copied()
            .filter(|v| self.enabled.contains(v))
    }
}

impl Serialize for VenueSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
