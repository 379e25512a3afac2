//! Simulated execution ledger.
//!
//! The ledger is the single owner of account balances. Position events touch
//! it through two operations only:
//!
//! - [`Ledger::apply_fill`] books both opening legs at once
//! - [`Ledger::apply_close`] books both closing legs at once
//!
//! Each operation validates first and mutates after, so a position's two legs
//! are never observable half-applied. Opening locks the notional of both legs
//! as collateral, which keeps `balance + locked` equal to equity before
//! unrealized PnL.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::error::TradeError;
use super::ids::VenueSide;
use super::money::{Price, Rate, Volume};
use super::position::HedgePosition;

/// Side of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LegSide {
    /// Contract leg, sold first and bought back on close.
    Short,
    /// Spot leg, bought first and sold on close.
    Long,
}

/// A simulated fill of one leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub side: LegSide,
    pub venue: VenueSide,
    pub price: Price,
    pub size: Volume,
    pub fee_rate: Rate,
}

impl Fill {
    pub const fn new(
        side: LegSide,
        venue: VenueSide,
        price: Price,
        size: Volume,
        fee_rate: Rate,
    ) -> Self {
        Self {
            side,
            venue,
            price,
            size,
            fee_rate,
        }
    }

    /// `price * size`.
    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }

    /// Fee charged on this fill.
    pub fn fee(&self) -> Decimal {
        self.notional() * self.fee_rate
    }
}

/// What opening a position cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillReceipt {
    /// Notional of both legs, held until close.
    pub collateral: Decimal,
    /// Fees for both opening fills.
    pub fees: Decimal,
}

/// What closing a position returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseReceipt {
    /// Leg PnL before any fees.
    pub gross_pnl: Decimal,
    /// Fees for both closing fills.
    pub exit_fees: Decimal,
    /// Gross PnL net of entry and exit fees.
    pub realized_pnl: Decimal,
}

/// Account balances in quote currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerAccount {
    /// Free balance available for new positions.
    pub balance: Decimal,
    /// Collateral held by open positions.
    pub locked: Decimal,
    /// Sum of realized PnL over closed positions.
    pub realized_pnl: Decimal,
    /// All fees paid, entry and exit.
    pub fees_paid: Decimal,
}

/// Closed-trade statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TradeStats {
    pub total_trades: u64,
    pub profitable_trades: u64,
    pub total_profit: Decimal,
}

impl TradeStats {
    /// Share of profitable trades in percent; zero before the first trade.
    #[must_use]
    pub fn win_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.profitable_trades) * Decimal::ONE_HUNDRED
            / Decimal::from(self.total_trades)
    }

    fn record(&mut self, pnl: Decimal) {
        self.total_trades += 1;
        if pnl > Decimal::ZERO {
            self.profitable_trades += 1;
        }
        self.total_profit += pnl;
    }
}

/// The simulated account.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_balance: Decimal,
    account: LedgerAccount,
    stats: TradeStats,
}

impl Ledger {
    /// Create a ledger funded with `initial_balance`.
    #[must_use]
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            account: LedgerAccount {
                balance: initial_balance,
                locked: Decimal::ZERO,
                realized_pnl: Decimal::ZERO,
                fees_paid: Decimal::ZERO,
            },
            stats: TradeStats::default(),
        }
    }

    #[must_use]
    pub const fn account(&self) -> &LedgerAccount {
        &self.account
    }

    #[must_use]
    pub const fn stats(&self) -> &TradeStats {
        &self.stats
    }

    #[must_use]
    pub const fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    /// Book both opening legs of a position.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::InsufficientBalance`] when collateral plus fees
    /// exceed the free balance. Nothing is booked in that case.
    pub fn apply_fill(&mut self, short: &Fill, long: &Fill) -> Result<FillReceipt, TradeError> {
        debug_assert_eq!(short.side, LegSide::Short);
        debug_assert_eq!(long.side, LegSide::Long);

        let collateral = short.notional() + long.notional();
        let fees = short.fee() + long.fee();
        let required = collateral + fees;

        if required > self.account.balance {
            return Err(TradeError::InsufficientBalance {
                required,
                available: self.account.balance,
            });
        }

        self.account.balance -= required;
        self.account.locked += collateral;
        self.account.fees_paid += fees;

        debug!(
            collateral = %collateral,
            fees = %fees,
            balance = %self.account.balance,
            "Opening fills booked"
        );

        Ok(FillReceipt { collateral, fees })
    }

    /// Book both closing legs of `position` and return the realized result.
    ///
    /// Realized PnL is the leg PnL minus entry and exit fees.
    pub fn apply_close(
        &mut self,
        position: &HedgePosition,
        short_exit: &Fill,
        long_exit: &Fill,
    ) -> CloseReceipt {
        debug_assert_eq!(short_exit.side, LegSide::Short);
        debug_assert_eq!(long_exit.side, LegSide::Long);

        let entry = position.receipt();
        let gross_pnl = position.gross_pnl(short_exit.price, long_exit.price);
        let exit_fees = short_exit.fee() + long_exit.fee();
        let realized_pnl = gross_pnl - entry.fees - exit_fees;

        self.account.locked -= entry.collateral;
        self.account.balance += entry.collateral + gross_pnl - exit_fees;
        self.account.fees_paid += exit_fees;
        self.account.realized_pnl += realized_pnl;
        self.stats.record(realized_pnl);

        debug!(
            gross = %gross_pnl,
            exit_fees = %exit_fees,
            realized = %realized_pnl,
            balance = %self.account.balance,
            "Closing fills booked"
        );

        CloseReceipt {
            gross_pnl,
            exit_fees,
            realized_pnl,
        }
    }

    /// Free balance plus locked collateral.
    #[must_use]
    pub fn equity(&self) -> Decimal {
        self.account.balance + self.account.locked
    }
}
