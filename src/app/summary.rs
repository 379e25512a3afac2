//! End-of-run summary: account, statistics, positions and error counts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::engine::Engine;
use super::health::HealthSnapshot;
use crate::domain::{
    AssetId, CloseReason, ClosedPosition, Direction, HedgePosition, LedgerAccount, PositionId,
    PositionStatus, Price, Rate, Spread, Volume,
};

/// Everything worth reporting about a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub universe: Vec<AssetId>,
    /// Spreads of the last evaluated cycle, widest first.
    pub market: Vec<Spread>,
    pub opportunities: u64,
    pub initial_balance: Decimal,
    pub account: LedgerAccount,
    pub unrealized_pnl: Decimal,
    /// Balance plus locked collateral plus unrealized PnL.
    pub equity: Decimal,
    pub stats: StatsView,
    pub open_positions: Vec<OpenPositionView>,
    pub closed_positions: Vec<ClosedPositionView>,
    pub health: HealthSnapshot,
}

impl RunSummary {
    pub(crate) fn capture(engine: &Engine, opportunities: u64) -> Self {
        let ledger = engine.ledger();
        let manager = engine.positions();
        let unrealized_pnl = manager.unrealized_pnl(engine.last_pairs());
        let stats = ledger.stats();

        let open_positions = manager
            .active()
            .map(|position| OpenPositionView::new(engine, position))
            .collect();
        let closed_positions = manager.closed().iter().map(ClosedPositionView::from).collect();

        Self {
            cycles: engine.cycle(),
            universe: engine.universe().to_vec(),
            market: engine.market().to_vec(),
            opportunities,
            initial_balance: ledger.initial_balance(),
            account: ledger.account().clone(),
            unrealized_pnl,
            equity: ledger.equity() + unrealized_pnl,
            stats: StatsView {
                total_trades: stats.total_trades,
                profitable_trades: stats.profitable_trades,
                win_rate: stats.win_rate().round_dp(2),
                total_profit: stats.total_profit,
            },
            open_positions,
            closed_positions,
            health: engine.health().snapshot(),
        }
    }

    /// Equity change since start.
    #[must_use]
    pub fn return_on_capital(&self) -> Decimal {
        self.equity - self.initial_balance
    }
}

/// Closed-trade statistics with the derived win rate.
#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub total_trades: u64,
    pub profitable_trades: u64,
    /// Percent.
    pub win_rate: Decimal,
    pub total_profit: Decimal,
}

/// An active position marked to the latest quotes.
#[derive(Debug, Clone, Serialize)]
pub struct OpenPositionView {
    pub id: PositionId,
    pub asset: AssetId,
    pub direction: Direction,
    pub status: PositionStatus,
    pub size: Volume,
    pub entry_short: Price,
    pub entry_long: Price,
    pub entry_spread: Rate,
    /// Spread in the position's direction at the latest quotes.
    pub current_spread: Option<Rate>,
    /// What closing now would capture, relative to entry, net of fees.
    pub exit_estimate: Option<Rate>,
    pub opened_at: DateTime<Utc>,
}

impl OpenPositionView {
    fn new(engine: &Engine, position: &HedgePosition) -> Self {
        let marked = engine
            .last_pairs()
            .get(position.asset())
            .map(|pair| engine.evaluator().evaluate_against(position, pair));
        Self {
            id: position.id(),
            asset: position.asset().clone(),
            direction: position.direction(),
            status: position.status(),
            size: position.size(),
            entry_short: position.entry_short(),
            entry_long: position.entry_long(),
            entry_spread: position.entry_spread(),
            current_spread: marked.as_ref().map(|s| s.percent_spread),
            exit_estimate: marked.as_ref().map(|s| s.estimated_profit),
            opened_at: position.opened_at(),
        }
    }
}

/// A closed position.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedPositionView {
    pub id: PositionId,
    pub asset: AssetId,
    pub reason: CloseReason,
    pub entry_spread: Rate,
    pub exit_spread: Rate,
    pub realized_pnl: Decimal,
    pub held_secs: i64,
}

impl From<&ClosedPosition> for ClosedPositionView {
    fn from(closed: &ClosedPosition) -> Self {
        Self {
            id: closed.position.id(),
            asset: closed.position.asset().clone(),
            reason: closed.reason,
            entry_spread: closed.position.entry_spread(),
            exit_spread: closed.exit_spread(),
            realized_pnl: closed.realized_pnl,
            held_secs: closed.holding_time().num_seconds(),
        }
    }
}
