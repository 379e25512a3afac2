//! Price quotes and same-cycle quote pairs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{AssetId, VenueSide};
use super::money::Price;

/// A single venue's price for an asset at a point in time.
///
/// Quotes are never mutated; the next poll produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub asset: AssetId,
    pub venue: VenueSide,
    pub price: Price,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn new(
        asset: AssetId,
        venue: VenueSide,
        price: Price,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            asset,
            venue,
            price,
            timestamp,
        }
    }
}

/// Quotes for one asset from both venues, captured in the same cycle.
///
/// Spreads, exits and marks are only ever computed from a `QuotePair`, so a
/// fresh quote from one venue is never compared with a stale one from the
/// other.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotePair {
    pub a: Quote,
    pub b: Quote,
}

impl QuotePair {
    pub fn new(a: Quote, b: Quote) -> Self {
        Self { a, b }
    }

    /// Asset of the pair (taken from venue A's quote).
    pub fn asset(&self) -> &AssetId {
        &self.a.asset
    }

    /// Quote from the given venue.
    pub fn quote(&self, side: VenueSide) -> &Quote {
        match side {
            VenueSide::A => &self.a,
            VenueSide::B => &self.b,
        }
    }

    /// Price from the given venue.
    pub fn price(&self, side: VenueSide) -> Price {
        self.quote(side).price
    }

    /// Oldest timestamp of the two quotes.
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.a.timestamp.min(self.b.timestamp)
    }
}
