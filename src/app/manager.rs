//! Hedge position manager.
//!
//! Owns every hedge position and drives it through `Open → Closing →
//! Closed`. All balance effects go through the [`Ledger`] passed in by the
//! caller, one atomic call per open and per close.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::config::{self, TradingConfig};
use crate::domain::{
    AssetId, CloseReason, ClosedPosition, FeeSchedule, Fill, HedgePosition, Ledger, LegSide,
    PositionId, QuotePair, Rate, Spread, TradeError, VenueSide, Volume,
};

/// Exit thresholds and capacity.
#[derive(Debug, Clone)]
pub struct PositionLimits {
    pub convergence_threshold: Rate,
    pub stop_loss_threshold: Rate,
    pub max_holding: Duration,
    pub max_open_positions: usize,
}

impl From<&TradingConfig> for PositionLimits {
    fn from(config: &TradingConfig) -> Self {
        Self {
            convergence_threshold: config.convergence_threshold,
            stop_loss_threshold: config.stop_loss_threshold,
            max_holding: config::secs(config.max_holding_secs),
            max_open_positions: config.max_open_positions,
        }
    }
}

/// Tracks open and closed hedge positions.
#[derive(Debug)]
pub struct PositionManager {
    limits: PositionLimits,
    fees: FeeSchedule,
    next_id: u64,
    active: BTreeMap<PositionId, HedgePosition>,
    closed: Vec<ClosedPosition>,
}

impl PositionManager {
    #[must_use]
    pub fn new(limits: PositionLimits, fees: FeeSchedule) -> Self {
        Self {
            limits,
            fees,
            next_id: 1,
            active: BTreeMap::new(),
            closed: Vec::new(),
        }
    }

    #[must_use]
    pub const fn limits(&self) -> &PositionLimits {
        &self.limits
    }

    /// Positions that are not closed, by id.
    pub fn active(&self) -> impl Iterator<Item = &HedgePosition> {
        self.active.values()
    }

    #[must_use]
    pub fn get(&self, id: PositionId) -> Option<&HedgePosition> {
        self.active.get(&id)
    }

    /// Closed positions in closing order.
    #[must_use]
    pub fn closed(&self) -> &[ClosedPosition] {
        &self.closed
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Assets that currently hold a non-closed position.
    #[must_use]
    pub fn active_assets(&self) -> BTreeSet<AssetId> {
        self.active.values().map(|p| p.asset().clone()).collect()
    }

    #[must_use]
    pub fn has_position(&self, asset: &AssetId) -> bool {
        self.active.values().any(|p| p.asset() == asset)
    }

    /// True while another hedge may be opened.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.active.len() < self.limits.max_open_positions
    }

    /// Open a hedge on `spread`: short the expensive leg, long the cheap one.
    ///
    /// # Errors
    ///
    /// - [`TradeError::InvalidSize`] if `size` is not positive
    /// - [`TradeError::DuplicatePosition`] if the asset already has a
    ///   non-closed position
    /// - [`TradeError::InsufficientBalance`] from the ledger; nothing is
    ///   recorded in that case
    pub fn open(
        &mut self,
        spread: &Spread,
        size: Volume,
        ledger: &mut Ledger,
        now: DateTime<Utc>,
        cycle: u64,
    ) -> Result<HedgePosition, TradeError> {
        if size <= Decimal::ZERO {
            return Err(TradeError::InvalidSize { size });
        }
        if self.has_position(&spread.asset) {
            return Err(TradeError::DuplicatePosition {
                asset: spread.asset.clone(),
            });
        }

        let direction = spread.direction;
        let short = self.fill(LegSide::Short, direction.short_venue(), spread.short_price, size);
        let long = self.fill(LegSide::Long, direction.long_venue(), spread.long_price, size);
        let receipt = ledger.apply_fill(&short, &long)?;

        let id = PositionId::new(self.next_id);
        self.next_id += 1;

        let position = HedgePosition::new(
            id,
            spread.asset.clone(),
            direction,
            spread.short_price,
            spread.long_price,
            size,
            receipt,
            now,
            cycle,
        );
        info!(
            id = %id,
            asset = %position.asset(),
            direction = %direction,
            size = %size,
            spread = %position.entry_spread(),
            "Hedge opened"
        );
        self.active.insert(id, position.clone());
        Ok(position)
    }

    /// Which exit condition, if any, `position` meets at `pair`.
    ///
    /// Checked in order: convergence (including a flipped spread), stop
    /// loss, maximum holding time. Convergence includes its threshold; the
    /// stop loss needs the spread to widen strictly past it.
    #[must_use]
    pub fn close_reason(
        &self,
        position: &HedgePosition,
        pair: &QuotePair,
        now: DateTime<Utc>,
    ) -> Option<CloseReason> {
        let current = position.direction().signed_spread(pair);

        if current <= self.limits.convergence_threshold {
            return Some(CloseReason::Converged);
        }
        if current - position.entry_spread() > self.limits.stop_loss_threshold {
            return Some(CloseReason::StopLoss);
        }
        if now - position.opened_at() >= self.limits.max_holding {
            return Some(CloseReason::MaxHoldingTime);
        }
        None
    }

    /// Check the exit conditions of position `id` and move it to `Closing`
    /// when one is met.
    ///
    /// # Errors
    ///
    /// [`TradeError::PositionNotFound`] or [`TradeError::AlreadyClosed`] when
    /// `id` is not an active position.
    pub fn evaluate_close(
        &mut self,
        id: PositionId,
        pair: &QuotePair,
        now: DateTime<Utc>,
    ) -> Result<Option<CloseReason>, TradeError> {
        let reason = {
            let position = self.active_position(id)?;
            self.close_reason(position, pair, now)
        };
        if let Some(reason) = reason {
            if let Some(position) = self.active.get_mut(&id) {
                position.begin_close()?;
                debug!(id = %id, reason = %reason, "Close condition met");
            }
        }
        Ok(reason)
    }

    /// Close position `id` at the prices in `pair` and book it.
    ///
    /// Returns realized PnL net of entry and exit fees.
    ///
    /// # Errors
    ///
    /// - [`TradeError::AlreadyClosed`] if the position was closed before
    /// - [`TradeError::PositionNotFound`] if no such position exists
    /// - [`TradeError::InvalidSnapshot`] if `pair` is for another asset
    pub fn close(
        &mut self,
        id: PositionId,
        pair: &QuotePair,
        reason: CloseReason,
        ledger: &mut Ledger,
        now: DateTime<Utc>,
    ) -> Result<Decimal, TradeError> {
        let position = self.active_position(id)?;
        if pair.asset() != position.asset() {
            return Err(TradeError::invalid_snapshot(
                position.asset(),
                format!("exit quotes are for {}", pair.asset()),
            ));
        }

        let Some(mut position) = self.active.remove(&id) else {
            return Err(TradeError::PositionNotFound { id });
        };
        position.begin_close()?;

        let short_venue = position.short_venue();
        let long_venue = position.long_venue();
        let short_exit = self.fill(LegSide::Short, short_venue, pair.price(short_venue), position.size());
        let long_exit = self.fill(LegSide::Long, long_venue, pair.price(long_venue), position.size());
        let receipt = ledger.apply_close(&position, &short_exit, &long_exit);
        position.finish_close()?;

        info!(
            id = %id,
            asset = %position.asset(),
            reason = %reason,
            pnl = %receipt.realized_pnl,
            "Hedge closed"
        );

        self.closed.push(ClosedPosition {
            position,
            exit_short: short_exit.price,
            exit_long: long_exit.price,
            exit_fees: receipt.exit_fees,
            realized_pnl: receipt.realized_pnl,
            reason,
            closed_at: now,
        });
        Ok(receipt.realized_pnl)
    }

    /// Mark-to-market leg PnL of active positions, before exit fees.
    ///
    /// Positions whose asset has no pair in `pairs` contribute nothing.
    #[must_use]
    pub fn unrealized_pnl(&self, pairs: &BTreeMap<AssetId, QuotePair>) -> Decimal {
        self.active
            .values()
            .filter_map(|position| {
                let pair = pairs.get(position.asset())?;
                Some(position.gross_pnl(
                    pair.price(position.short_venue()),
                    pair.price(position.long_venue()),
                ))
            })
            .sum()
    }

    fn active_position(&self, id: PositionId) -> Result<&HedgePosition, TradeError> {
        if let Some(position) = self.active.get(&id) {
            return Ok(position);
        }
        if self.closed.iter().any(|c| c.position.id() == id) {
            return Err(TradeError::AlreadyClosed { id });
        }
        Err(TradeError::PositionNotFound { id })
    }

    fn fill(&self, side: LegSide, venue: VenueSide, price: Decimal, size: Volume) -> Fill {
        Fill::new(side, venue, price, size, self.fees.for_side(venue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, PositionStatus, SpreadEvaluator};
    use crate::testkit::domain::{asset, quote_pair, ts};
    use rust_decimal_macros::dec;

    const FEE: Decimal = dec!(0.001);

    fn manager() -> PositionManager {
        PositionManager::new(
            PositionLimits {
                convergence_threshold: dec!(0.0005),
                stop_loss_threshold: dec!(0.01),
                max_holding: Duration::seconds(3600),
                max_open_positions: 2,
            },
            FeeSchedule::flat(FEE),
        )
    }

    fn spread_at(id: &str, price_a: Decimal, price_b: Decimal) -> Spread {
        let evaluator = SpreadEvaluator::new(FeeSchedule::flat(FEE), Duration::seconds(5));
        evaluator
            .spreads(&quote_pair(id, price_a, price_b))
            .pop()
            .unwrap()
    }

    fn open_btc(manager: &mut PositionManager, ledger: &mut Ledger) -> HedgePosition {
        let spread = spread_at("BTC/USDT", dec!(61000), dec!(60000));
        manager.open(&spread, dec!(1), ledger, ts(0), 1).unwrap()
    }

    #[test]
    fn open_shorts_expensive_leg() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);

        assert_eq!(position.direction(), Direction::AShortBLong);
        assert_eq!(position.entry_short(), dec!(61000));
        assert_eq!(position.entry_long(), dec!(60000));
        assert_eq!(position.entry_fees(), dec!(121));
        assert_eq!(position.status(), PositionStatus::Open);
        assert_eq!(manager.active_count(), 1);
        assert!(manager.has_position(&asset("BTC/USDT")));
        assert_eq!(ledger.account().locked, dec!(121000));
    }

    #[test]
    fn second_open_on_same_asset_is_rejected() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(500000));
        open_btc(&mut manager, &mut ledger);
        let balance = ledger.account().balance;

        let spread = spread_at("BTC/USDT", dec!(61000), dec!(60000));
        let err = manager
            .open(&spread, dec!(1), &mut ledger, ts(1_000), 2)
            .unwrap_err();

        assert!(matches!(err, TradeError::DuplicatePosition { .. }));
        assert_eq!(manager.active_count(), 1);
        assert_eq!(ledger.account().balance, balance);
    }

    #[test]
    fn insufficient_balance_records_nothing() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(1000));
        let spread = spread_at("BTC/USDT", dec!(61000), dec!(60000));
        let err = manager
            .open(&spread, dec!(1), &mut ledger, ts(0), 1)
            .unwrap_err();

        assert!(matches!(err, TradeError::InsufficientBalance { .. }));
        assert_eq!(manager.active_count(), 0);
        assert_eq!(ledger.account().balance, dec!(1000));
    }

    #[test]
    fn rejects_non_positive_size() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(1000));
        let spread = spread_at("BTC/USDT", dec!(61000), dec!(60000));
        assert!(matches!(
            manager.open(&spread, dec!(0), &mut ledger, ts(0), 1),
            Err(TradeError::InvalidSize { .. })
        ));
    }

    #[test]
    fn converged_close_books_pnl() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);

        let exit = quote_pair("BTC/USDT", dec!(60500), dec!(60500));
        let reason = manager
            .evaluate_close(position.id(), &exit, ts(10_000))
            .unwrap();
        assert_eq!(reason, Some(CloseReason::Converged));
        assert_eq!(
            manager.get(position.id()).unwrap().status(),
            PositionStatus::Closing
        );

        let pnl = manager
            .close(position.id(), &exit, CloseReason::Converged, &mut ledger, ts(10_000))
            .unwrap();
        assert_eq!(pnl, dec!(1000) - dec!(121) - dec!(121));
        assert_eq!(manager.active_count(), 0);
        assert_eq!(manager.closed().len(), 1);
        assert_eq!(manager.closed()[0].position.status(), PositionStatus::Closed);
        assert_eq!(manager.closed()[0].holding_time(), Duration::seconds(10));
    }

    #[test]
    fn both_legs_rising_close() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);

        let exit = quote_pair("BTC/USDT", dec!(61800), dec!(61500));
        let pnl = manager
            .close(position.id(), &exit, CloseReason::Manual, &mut ledger, ts(5_000))
            .unwrap();
        assert_eq!(pnl, dec!(700) - dec!(121) - dec!(123.3));
    }

    #[test]
    fn close_twice_is_already_closed() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);
        let exit = quote_pair("BTC/USDT", dec!(60500), dec!(60500));

        manager
            .close(position.id(), &exit, CloseReason::Converged, &mut ledger, ts(1_000))
            .unwrap();
        let balance = ledger.account().balance;

        let err = manager
            .close(position.id(), &exit, CloseReason::Converged, &mut ledger, ts(2_000))
            .unwrap_err();
        assert!(matches!(err, TradeError::AlreadyClosed { .. }));
        assert_eq!(ledger.account().balance, balance);
        assert_eq!(ledger.stats().total_trades, 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(1000));
        let exit = quote_pair("BTC/USDT", dec!(1), dec!(1));
        assert!(matches!(
            manager.close(PositionId::new(42), &exit, CloseReason::Manual, &mut ledger, ts(0)),
            Err(TradeError::PositionNotFound { .. })
        ));
    }

    #[test]
    fn close_with_other_asset_quotes_is_rejected() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);
        let exit = quote_pair("ETH/USDT", dec!(3000), dec!(3000));

        assert!(matches!(
            manager.close(position.id(), &exit, CloseReason::Manual, &mut ledger, ts(0)),
            Err(TradeError::InvalidSnapshot { .. })
        ));
        assert_eq!(manager.active_count(), 1);
    }

    #[test]
    fn close_conditions() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);

        // Spread still wide: keep holding.
        let holding = quote_pair("BTC/USDT", dec!(61000), dec!(60100));
        assert_eq!(manager.close_reason(&position, &holding, ts(1_000)), None);

        // Spread flipped: converged.
        let flipped = quote_pair("BTC/USDT", dec!(60000), dec!(60100));
        assert_eq!(
            manager.close_reason(&position, &flipped, ts(1_000)),
            Some(CloseReason::Converged)
        );

        // Entry ~1.67%, now ~2.83%: stop loss.
        let widened = quote_pair("BTC/USDT", dec!(61700), dec!(60000));
        assert_eq!(
            manager.close_reason(&position, &widened, ts(1_000)),
            Some(CloseReason::StopLoss)
        );

        assert_eq!(
            manager.close_reason(&position, &holding, ts(3_600_000)),
            Some(CloseReason::MaxHoldingTime)
        );
    }

    #[test]
    fn stop_loss_needs_spread_past_threshold() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);

        // Entry 1000/60000, now 1600/60000: widened by exactly 1%.
        let at_stop = quote_pair("BTC/USDT", dec!(61600), dec!(60000));
        assert_eq!(manager.close_reason(&position, &at_stop, ts(1_000)), None);

        let past_stop = quote_pair("BTC/USDT", dec!(61601), dec!(60000));
        assert_eq!(
            manager.close_reason(&position, &past_stop, ts(1_000)),
            Some(CloseReason::StopLoss)
        );
    }

    #[test]
    fn equal_prices_elsewhere_do_not_close() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        let position = open_btc(&mut manager, &mut ledger);

        let btc = quote_pair("BTC/USDT", dec!(61000), dec!(60000));
        assert_eq!(
            manager.evaluate_close(position.id(), &btc, ts(1_000)).unwrap(),
            None
        );
        assert_eq!(
            manager.get(position.id()).unwrap().status(),
            PositionStatus::Open
        );
    }

    #[test]
    fn capacity_is_enforced_by_caller() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(500000));
        open_btc(&mut manager, &mut ledger);
        assert!(manager.has_capacity());

        let eth = spread_at("ETH/USDT", dec!(3030), dec!(3000));
        manager.open(&eth, dec!(1), &mut ledger, ts(0), 1).unwrap();
        assert!(!manager.has_capacity());
        assert_eq!(
            manager.active_assets().into_iter().collect::<Vec<_>>(),
            vec![asset("BTC/USDT"), asset("ETH/USDT")]
        );
    }

    #[test]
    fn unrealized_pnl_marks_active_positions() {
        let mut manager = manager();
        let mut ledger = Ledger::new(dec!(200000));
        open_btc(&mut manager, &mut ledger);

        let mut pairs = BTreeMap::new();
        pairs.insert(asset("BTC/USDT"), quote_pair("BTC/USDT", dec!(60800), dec!(60100)));
        // +200 short, +100 long.
        assert_eq!(manager.unrealized_pnl(&pairs), dec!(300));
        assert_eq!(manager.unrealized_pnl(&BTreeMap::new()), Decimal::ZERO);
    }
}
