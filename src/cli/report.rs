//! Human-readable end-of-run report.

use tabled::{Table, Tabled};

use crate::app::RunSummary;
use crate::cli::output;

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Short")]
    short: String,
    #[tabled(rename = "Long")]
    long: String,
    #[tabled(rename = "Spread")]
    spread: String,
    #[tabled(rename = "Net of fees")]
    net: String,
}

#[derive(Tabled)]
struct OpenRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Entry")]
    entry: String,
    #[tabled(rename = "Now")]
    current: String,
    #[tabled(rename = "Exit est.")]
    exit_estimate: String,
}

#[derive(Tabled)]
struct ClosedRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Entry")]
    entry: String,
    #[tabled(rename = "Exit")]
    exit: String,
    #[tabled(rename = "Held")]
    held: String,
    #[tabled(rename = "PnL")]
    pnl: String,
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Venue")]
    venue: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "In window")]
    in_window: u64,
    #[tabled(rename = "Total")]
    total: u64,
}

/// Print the summary as sections and tables.
pub fn print(summary: &RunSummary) {
    output::section("Run");
    output::key_value("Cycles", summary.cycles);
    output::key_value(
        "Universe",
        summary
            .universe
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    );
    output::key_value("Selected", summary.opportunities);

    if !summary.market.is_empty() {
        output::section("Opportunities");
        let rows = summary.market.iter().map(|s| MarketRow {
            asset: s.asset.to_string(),
            direction: s.direction.to_string(),
            short: s.short_price.to_string(),
            long: s.long_price.to_string(),
            spread: output::percent(s.percent_spread),
            net: output::percent(s.estimated_profit),
        });
        output::lines(&Table::new(rows).to_string());
    }

    output::section("Account");
    output::key_value("Initial balance", summary.initial_balance);
    output::key_value("Balance", summary.account.balance);
    output::key_value("Locked", summary.account.locked);
    output::key_value("Fees paid", summary.account.fees_paid);
    output::key_value("Realized PnL", output::signed(summary.account.realized_pnl));
    output::key_value("Unrealized PnL", output::signed(summary.unrealized_pnl));
    output::key_value("Equity", summary.equity);
    output::key_value("Return", output::signed(summary.return_on_capital()));

    output::section("Trades");
    output::key_value("Closed", summary.stats.total_trades);
    output::key_value("Profitable", summary.stats.profitable_trades);
    output::key_value("Win rate", format!("{}%", summary.stats.win_rate));
    output::key_value("Total profit", output::signed(summary.stats.total_profit));

    if !summary.open_positions.is_empty() {
        output::section("Open positions");
        let rows = summary.open_positions.iter().map(|p| OpenRow {
            id: p.id.to_string(),
            asset: p.asset.to_string(),
            direction: p.direction.to_string(),
            size: p.size.to_string(),
            entry: output::percent(p.entry_spread),
            current: p.current_spread.map_or_else(|| "-".into(), output::percent),
            exit_estimate: p.exit_estimate.map_or_else(|| "-".into(), output::percent),
        });
        output::lines(&Table::new(rows).to_string());
    }

    if !summary.closed_positions.is_empty() {
        output::section("Closed positions");
        let rows = summary.closed_positions.iter().map(|p| ClosedRow {
            id: p.id.to_string(),
            asset: p.asset.to_string(),
            reason: p.reason.to_string(),
            entry: output::percent(p.entry_spread),
            exit: output::percent(p.exit_spread),
            held: format!("{}s", p.held_secs),
            pnl: p.realized_pnl.to_string(),
        });
        output::lines(&Table::new(rows).to_string());
    }

    output::section("Errors");
    if summary.health.counts.is_empty() {
        output::ok("No failures recorded");
    } else {
        let rows = summary.health.counts.iter().map(|c| ErrorRow {
            venue: c.source.map_or_else(|| "-".into(), |side| side.to_string()),
            kind: c.kind.to_string(),
            in_window: c.in_window,
            total: c.total,
        });
        output::lines(&Table::new(rows).to_string());
    }
    for (side, until) in &summary.health.degraded {
        output::warn(&format!("Venue {side} degraded until {until}"));
    }
}
