//! Builders for domain primitives used across tests.
//!
//! All timestamps are offsets from a fixed epoch so tests never depend on
//! the wall clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    AssetId, Direction, FillReceipt, Price, Quote, QuotePair, Rate, Spread, VenueSide,
};

/// 2024-01-01T00:00:00Z.
const EPOCH_SECS: i64 = 1_704_067_200;

/// Fixed epoch plus `ms` milliseconds.
pub fn ts(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_SECS, 0).unwrap() + Duration::milliseconds(ms)
}

/// Create an [`AssetId`] from a string.
pub fn asset(id: &str) -> AssetId {
    AssetId::from(id)
}

/// A quote for `id` on `venue` at `at`.
pub fn quote_at(id: &str, venue: VenueSide, price: Price, at: DateTime<Utc>) -> Quote {
    Quote::new(asset(id), venue, price, at)
}

/// Quotes for `id` from both venues, both taken at [`ts(0)`](ts).
pub fn quote_pair(id: &str, price_a: Price, price_b: Price) -> QuotePair {
    QuotePair::new(
        quote_at(id, VenueSide::A, price_a, ts(0)),
        quote_at(id, VenueSide::B, price_b, ts(0)),
    )
}

/// A valid A-short spread with the given estimated profit.
pub fn spread(id: &str, estimated_profit: Rate) -> Spread {
    Spread {
        asset: asset(id),
        direction: Direction::AShortBLong,
        short_price: Decimal::from(101),
        long_price: Decimal::from(100),
        percent_spread: Decimal::new(1, 2),
        estimated_profit,
        observed_at: ts(0),
    }
}

/// A ledger receipt with the given collateral and fees.
pub fn receipt(collateral: Decimal, fees: Decimal) -> FillReceipt {
    FillReceipt { collateral, fees }
}
