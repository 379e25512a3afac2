//! Hedge position types and the position state machine.
//!
//! A hedge position moves strictly forward: `Open → Closing → Closed`.
//! Reopening an asset after close creates a new position with a new id.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::TradeError;
use super::ids::{AssetId, PositionId, VenueSide};
use super::ledger::FillReceipt;
use super::money::{Price, Rate, Volume};
use super::spread::Direction;

/// Lifecycle state of a hedge position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionStatus {
    /// Both legs filled; monitored every cycle.
    Open,
    /// A close condition fired; the close has not been applied yet.
    Closing,
    /// Close applied and booked in the ledger.
    Closed,
}

impl PositionStatus {
    /// Returns true if the position is open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true unless the position is closed.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Returns true if the position is closed.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CloseReason {
    /// Spread narrowed to the convergence threshold (or flipped).
    Converged,
    /// Spread widened past the stop-loss bound.
    StopLoss,
    /// Position outlived the maximum holding duration.
    MaxHoldingTime,
    /// Closed on operator request (shutdown flatten, tests).
    Manual,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::MaxHoldingTime => write!(f, "max_holding_time"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A paired short + long position on the same asset across both venues.
#[derive(Debug, Clone, Serialize)]
pub struct HedgePosition {
    id: PositionId,
    asset: AssetId,
    direction: Direction,
    entry_short: Price,
    entry_long: Price,
    size: Volume,
    entry_spread: Rate,
    receipt: FillReceipt,
    opened_at: DateTime<Utc>,
    entry_cycle: u64,
    status: PositionStatus,
}

impl HedgePosition {
    /// Create a new open position.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: PositionId,
        asset: AssetId,
        direction: Direction,
        entry_short: Price,
        entry_long: Price,
        size: Volume,
        receipt: FillReceipt,
        opened_at: DateTime<Utc>,
        entry_cycle: u64,
    ) -> Self {
        let entry_spread = if entry_long.is_zero() {
            Decimal::ZERO
        } else {
            (entry_short - entry_long) / entry_long
        };
        Self {
            id,
            asset,
            direction,
            entry_short,
            entry_long,
            size,
            entry_spread,
            receipt,
            opened_at,
            entry_cycle,
            status: PositionStatus::Open,
        }
    }

    #[must_use]
    pub const fn id(&self) -> PositionId {
        self.id
    }

    #[must_use]
    pub const fn asset(&self) -> &AssetId {
        &self.asset
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Venue holding the short leg.
    #[must_use]
    pub const fn short_venue(&self) -> VenueSide {
        self.direction.short_venue()
    }

    /// Venue holding the long leg.
    #[must_use]
    pub const fn long_venue(&self) -> VenueSide {
        self.direction.long_venue()
    }

    #[must_use]
    pub const fn entry_short(&self) -> Price {
        self.entry_short
    }

    #[must_use]
    pub const fn entry_long(&self) -> Price {
        self.entry_long
    }

    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }

    /// Relative spread at entry, `(short - long) / long`.
    #[must_use]
    pub const fn entry_spread(&self) -> Rate {
        self.entry_spread
    }

    /// Ledger receipt for the opening fills.
    #[must_use]
    pub const fn receipt(&self) -> &FillReceipt {
        &self.receipt
    }

    /// Fees paid when the position was opened.
    #[must_use]
    pub const fn entry_fees(&self) -> Decimal {
        self.receipt.fees
    }

    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Evaluation cycle in which the position was opened.
    #[must_use]
    pub const fn entry_cycle(&self) -> u64 {
        self.entry_cycle
    }

    #[must_use]
    pub const fn status(&self) -> PositionStatus {
        self.status
    }

    /// Gross PnL of both legs at the given exit prices, before fees.
    ///
    /// `(entry_short - exit_short) + (exit_long - entry_long)`, per unit,
    /// times size.
    #[must_use]
    pub fn gross_pnl(&self, exit_short: Price, exit_long: Price) -> Decimal {
        ((self.entry_short - exit_short) + (exit_long - self.entry_long)) * self.size
    }

    /// Move `Open → Closing`. Idempotent while closing.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::AlreadyClosed`] on a closed position.
    pub fn begin_close(&mut self) -> Result<(), TradeError> {
        match self.status {
            PositionStatus::Open | PositionStatus::Closing => {
                self.status = PositionStatus::Closing;
                Ok(())
            }
            PositionStatus::Closed => Err(TradeError::AlreadyClosed { id: self.id }),
        }
    }

    /// Move to `Closed`.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::AlreadyClosed`] on a closed position.
    pub(crate) fn finish_close(&mut self) -> Result<(), TradeError> {
        if self.status.is_closed() {
            return Err(TradeError::AlreadyClosed { id: self.id });
        }
        self.status = PositionStatus::Closed;
        Ok(())
    }
}

/// Archived record of a closed position.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedPosition {
    pub position: HedgePosition,
    pub exit_short: Price,
    pub exit_long: Price,
    pub exit_fees: Decimal,
    pub realized_pnl: Decimal,
    pub reason: CloseReason,
    pub closed_at: DateTime<Utc>,
}

impl ClosedPosition {
    /// Relative spread at exit in the position's direction.
    #[must_use]
    pub fn exit_spread(&self) -> Rate {
        if self.exit_long.is_zero() {
            return Decimal::ZERO;
        }
        (self.exit_short - self.exit_long) / self.exit_long
    }

    /// How long the position was held.
    #[must_use]
    pub fn holding_time(&self) -> chrono::Duration {
        self.closed_at - self.position.opened_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{receipt, ts};
    use rust_decimal_macros::dec;

    fn make_position() -> HedgePosition {
        HedgePosition::new(
            PositionId::new(1),
            AssetId::from("BTC/USDT"),
            Direction::AShortBLong,
            dec!(61000),
            dec!(60000),
            dec!(1),
            receipt(dec!(121000), dec!(121)),
            ts(0),
            1,
        )
    }

    #[test]
    fn new_position_is_open() {
        let position = make_position();
        assert!(position.status().is_open());
        assert_eq!(position.short_venue(), VenueSide::A);
        assert_eq!(position.long_venue(), VenueSide::B);
        assert_eq!(position.entry_spread(), dec!(1000) / dec!(60000));
        assert_eq!(position.entry_fees(), dec!(121));
    }

    #[test]
    fn gross_pnl_converged() {
        let position = make_position();
        assert_eq!(position.gross_pnl(dec!(60500), dec!(60500)), dec!(1000));
    }

    #[test]
    fn gross_pnl_both_legs_rising() {
        let position = make_position();
        // -800 on the short leg, +1500 on the long leg.
        assert_eq!(position.gross_pnl(dec!(61800), dec!(61500)), dec!(700));
    }

    #[test]
    fn state_machine_moves_forward_only() {
        let mut position = make_position();
        position.begin_close().unwrap();
        assert_eq!(position.status(), PositionStatus::Closing);
        position.begin_close().unwrap();
        assert_eq!(position.status(), PositionStatus::Closing);

        position.finish_close().unwrap();
        assert!(position.status().is_closed());

        assert!(matches!(
            position.begin_close(),
            Err(TradeError::AlreadyClosed { .. })
        ));
        assert!(matches!(
            position.finish_close(),
            Err(TradeError::AlreadyClosed { .. })
        ));
    }
}
