//! Spread evaluation between the two venues.
//!
//! For each asset the evaluator looks at both directions:
//!
//! - `AShortBLong`: short venue A, long venue B, `(pA - pB) / pB`
//! - `BShortALong`: short venue B, long venue A, `(pB - pA) / pA`
//!
//! Only the direction whose short leg is strictly more expensive is valid,
//! so an evaluation yields zero or one spread.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::TradeError;
use super::ids::{AssetId, VenueSide};
use super::money::{Price, Rate};
use super::position::HedgePosition;
use super::quote::{Quote, QuotePair};

/// Which venue carries the short leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Short on venue A, long on venue B.
    AShortBLong,
    /// Short on venue B, long on venue A.
    BShortALong,
}

impl Direction {
    /// Both directions, in evaluation order.
    pub const ALL: [Direction; 2] = [Direction::AShortBLong, Direction::BShortALong];

    /// Venue holding the short (contract) leg.
    #[must_use]
    pub const fn short_venue(self) -> VenueSide {
        match self {
            Self::AShortBLong => VenueSide::A,
            Self::BShortALong => VenueSide::B,
        }
    }

    /// Venue holding the long (spot) leg.
    #[must_use]
    pub const fn long_venue(self) -> VenueSide {
        self.short_venue().other()
    }

    /// Relative spread of the pair in this direction; negative when the
    /// short leg is the cheaper one.
    #[must_use]
    pub fn signed_spread(self, pair: &QuotePair) -> Rate {
        let short = pair.price(self.short_venue());
        let long = pair.price(self.long_venue());
        if long.is_zero() {
            return Decimal::ZERO;
        }
        (short - long) / long
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AShortBLong => write!(f, "A short / B long"),
            Self::BShortALong => write!(f, "B short / A long"),
        }
    }
}

/// Trading fee per venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub a: Rate,
    pub b: Rate,
}

impl FeeSchedule {
    pub const fn new(a: Rate, b: Rate) -> Self {
        Self { a, b }
    }

    /// Same fee on both venues.
    pub const fn flat(rate: Rate) -> Self {
        Self { a: rate, b: rate }
    }

    /// Fee charged on the given venue.
    pub const fn for_side(&self, side: VenueSide) -> Rate {
        match side {
            VenueSide::A => self.a,
            VenueSide::B => self.b,
        }
    }

    /// Fee cost of holding both legs, one fee per leg.
    pub fn round_trip(&self) -> Rate {
        self.a + self.b
    }
}

/// A directional price difference for one asset. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spread {
    pub asset: AssetId,
    pub direction: Direction,
    /// Price of the short leg (the expensive one when the spread is valid).
    pub short_price: Price,
    /// Price of the long leg.
    pub long_price: Price,
    /// `(short - long) / long`.
    pub percent_spread: Rate,
    /// Spread net of fees; relative to the entry spread when evaluated
    /// against an open position.
    pub estimated_profit: Rate,
    pub observed_at: DateTime<Utc>,
}

/// Computes spreads from same-cycle quote pairs.
#[derive(Debug, Clone)]
pub struct SpreadEvaluator {
    fees: FeeSchedule,
    staleness: Duration,
}

impl SpreadEvaluator {
    #[must_use]
    pub const fn new(fees: FeeSchedule, staleness: Duration) -> Self {
        Self { fees, staleness }
    }

    #[must_use]
    pub const fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Validate a pair of quotes for `asset` against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::InvalidSnapshot`] when the quotes are for a
    /// different asset, come from the wrong venue slot, carry a
    /// non-positive price, are older than the staleness bound, or were
    /// captured too far apart to belong to the same cycle.
    pub fn snapshot(
        &self,
        asset: &AssetId,
        quote_a: Quote,
        quote_b: Quote,
        now: DateTime<Utc>,
    ) -> Result<QuotePair, TradeError> {
        if &quote_a.asset != asset || &quote_b.asset != asset {
            return Err(TradeError::invalid_snapshot(
                asset,
                format!(
                    "quotes are for {} and {}",
                    quote_a.asset, quote_b.asset
                ),
            ));
        }
        if quote_a.venue != VenueSide::A || quote_b.venue != VenueSide::B {
            return Err(TradeError::invalid_snapshot(asset, "venue slots swapped"));
        }
        for quote in [&quote_a, &quote_b] {
            if quote.price <= Decimal::ZERO {
                return Err(TradeError::invalid_snapshot(
                    asset,
                    format!("non-positive price {} on venue {}", quote.price, quote.venue),
                ));
            }
            let age = now - quote.timestamp;
            if age > self.staleness {
                return Err(TradeError::invalid_snapshot(
                    asset,
                    format!(
                        "quote from venue {} is {}ms old",
                        quote.venue,
                        age.num_milliseconds()
                    ),
                ));
            }
        }
        let skew = if quote_a.timestamp > quote_b.timestamp {
            quote_a.timestamp - quote_b.timestamp
        } else {
            quote_b.timestamp - quote_a.timestamp
        };
        if skew > self.staleness {
            return Err(TradeError::invalid_snapshot(
                asset,
                format!("quotes captured {}ms apart", skew.num_milliseconds()),
            ));
        }
        Ok(QuotePair::new(quote_a, quote_b))
    }

    /// Evaluate both directions for one asset.
    ///
    /// Returns zero spreads on an exact tie and otherwise exactly one.
    ///
    /// # Errors
    ///
    /// See [`SpreadEvaluator::snapshot`].
    pub fn evaluate(
        &self,
        asset: &AssetId,
        quote_a: Quote,
        quote_b: Quote,
        now: DateTime<Utc>,
    ) -> Result<Vec<Spread>, TradeError> {
        let pair = self.snapshot(asset, quote_a, quote_b, now)?;
        Ok(self.spreads(&pair))
    }

    /// Spreads of an already validated pair.
    #[must_use]
    pub fn spreads(&self, pair: &QuotePair) -> Vec<Spread> {
        Direction::ALL
            .into_iter()
            .filter(|direction| {
                pair.price(direction.short_venue()) > pair.price(direction.long_venue())
            })
            .map(|direction| {
                let percent_spread = direction.signed_spread(pair);
                self.build(pair, direction, percent_spread, percent_spread - self.fees.round_trip())
            })
            .collect()
    }

    /// Spread of `pair` in the direction of an open position.
    ///
    /// `estimated_profit` is what closing now would capture relative to the
    /// entry spread: `entry - current - fees`. The current spread may be
    /// negative when the market has flipped.
    #[must_use]
    pub fn evaluate_against(&self, position: &HedgePosition, pair: &QuotePair) -> Spread {
        let direction = position.direction();
        let current = direction.signed_spread(pair);
        let estimated = position.entry_spread() - current - self.fees.round_trip();
        self.build(pair, direction, current, estimated)
    }

    fn build(
        &self,
        pair: &QuotePair,
        direction: Direction,
        percent_spread: Rate,
        estimated_profit: Rate,
    ) -> Spread {
        Spread {
            asset: pair.asset().clone(),
            direction,
            short_price: pair.price(direction.short_venue()),
            long_price: pair.price(direction.long_venue()),
            percent_spread,
            estimated_profit,
            observed_at: pair.observed_at(),
        }
    }
}

/// Order spreads widest first for display, ties by asset.
#[must_use]
pub fn rank_by_spread(mut spreads: Vec<Spread>) -> Vec<Spread> {
    spreads.sort_by(|x, y| {
        y.percent_spread
            .cmp(&x.percent_spread)
            .then_with(|| x.asset.cmp(&y.asset))
    });
    spreads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{asset, quote_pair, quote_at, ts};
    use rust_decimal_macros::dec;

    fn evaluator() -> SpreadEvaluator {
        SpreadEvaluator::new(FeeSchedule::flat(dec!(0.001)), Duration::seconds(5))
    }

    fn eval(price_a: Decimal, price_b: Decimal) -> Vec<Spread> {
        let pair = quote_pair("BTC/USDT", price_a, price_b);
        evaluator()
            .evaluate(&asset("BTC/USDT"), pair.a, pair.b, ts(0))
            .unwrap()
    }

    #[test]
    fn tie_yields_no_spread() {
        for price in [dec!(0.49), dec!(1), dec!(60000), dec!(123456.789)] {
            assert!(eval(price, price).is_empty(), "tie at {price}");
        }
    }

    #[test]
    fn a_above_b_shorts_a() {
        let spreads = eval(dec!(61000), dec!(60000));
        assert_eq!(spreads.len(), 1);

        let spread = &spreads[0];
        assert_eq!(spread.direction, Direction::AShortBLong);
        assert_eq!(spread.short_price, dec!(61000));
        assert_eq!(spread.long_price, dec!(60000));
        assert_eq!(spread.percent_spread, dec!(1000) / dec!(60000));
        assert_eq!(
            spread.estimated_profit,
            dec!(1000) / dec!(60000) - dec!(0.002)
        );
    }

    #[test]
    fn b_above_a_shorts_b() {
        let spreads = eval(dec!(2990), dec!(3000));
        assert_eq!(spreads.len(), 1);
        assert_eq!(spreads[0].direction, Direction::BShortALong);
        assert_eq!(spreads[0].short_price, dec!(3000));
        assert_eq!(spreads[0].long_price, dec!(2990));
    }

    #[test]
    fn directions_are_mutually_exclusive() {
        let prices = [dec!(0.5), dec!(1), dec!(99.99), dec!(100), dec!(100.01), dec!(60000)];
        for a in prices {
            for b in prices {
                let spreads = eval(a, b);
                assert!(spreads.len() <= 1, "a={a} b={b}");
                assert_eq!(spreads.is_empty(), a == b, "a={a} b={b}");
            }
        }
    }

    #[test]
    fn rejects_mismatched_assets() {
        let a = quote_at("BTC/USDT", VenueSide::A, dec!(100), ts(0));
        let b = quote_at("ETH/USDT", VenueSide::B, dec!(99), ts(0));
        let err = evaluator()
            .evaluate(&asset("BTC/USDT"), a, b, ts(0))
            .unwrap_err();
        assert!(matches!(err, TradeError::InvalidSnapshot { .. }));
    }

    #[test]
    fn rejects_stale_quote() {
        let a = quote_at("BTC/USDT", VenueSide::A, dec!(100), ts(0));
        let b = quote_at("BTC/USDT", VenueSide::B, dec!(99), ts(6_000));
        let err = evaluator()
            .evaluate(&asset("BTC/USDT"), a, b, ts(6_000))
            .unwrap_err();
        assert!(matches!(err, TradeError::InvalidSnapshot { .. }));
    }

    #[test]
    fn accepts_quote_at_staleness_bound() {
        let a = quote_at("BTC/USDT", VenueSide::A, dec!(100), ts(0));
        let b = quote_at("BTC/USDT", VenueSide::B, dec!(99), ts(5_000));
        let spreads = evaluator()
            .evaluate(&asset("BTC/USDT"), a, b, ts(5_000))
            .unwrap();
        assert_eq!(spreads.len(), 1);
    }

    #[test]
    fn rejects_non_positive_price() {
        let a = quote_at("BTC/USDT", VenueSide::A, dec!(0), ts(0));
        let b = quote_at("BTC/USDT", VenueSide::B, dec!(99), ts(0));
        assert!(evaluator()
            .evaluate(&asset("BTC/USDT"), a, b, ts(0))
            .is_err());
    }

    #[test]
    fn signed_spread_goes_negative_when_flipped() {
        let pair = quote_pair("BTC/USDT", dec!(99), dec!(100));
        assert_eq!(Direction::AShortBLong.signed_spread(&pair), dec!(-0.01));
        assert!(Direction::BShortALong.signed_spread(&pair) > Decimal::ZERO);
    }

    #[test]
    fn round_trip_sums_both_venues() {
        let fees = FeeSchedule::new(dec!(0.001), dec!(0.002));
        assert_eq!(fees.round_trip(), dec!(0.003));
        assert_eq!(fees.for_side(VenueSide::B), dec!(0.002));
    }

    #[test]
    fn ranks_widest_spread_first() {
        let evaluator = evaluator();
        let spreads: Vec<Spread> = [
            quote_pair("ADA/USDT", dec!(0.50), dec!(0.49)),
            quote_pair("BTC/USDT", dec!(60100), dec!(60000)),
            quote_pair("ETH/USDT", dec!(2990), dec!(3020)),
            quote_pair("DOT/USDT", dec!(7.049), dec!(6.9)),
        ]
        .iter()
        .flat_map(|pair| evaluator.spreads(pair))
        .collect();

        let ranked: Vec<String> = rank_by_spread(spreads)
            .iter()
            .map(|s| s.asset.to_string())
            .collect();
        assert_eq!(ranked, ["DOT/USDT", "ADA/USDT", "ETH/USDT", "BTC/USDT"]);
    }
}
