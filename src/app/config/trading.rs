//! Trading thresholds, sizing and capital.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::AssetId;

/// Trading configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Assets to trade when the venues share no listing.
    pub supported_pairs: Vec<AssetId>,
    /// Minimum estimated profit (fraction, net of fees) to open a hedge.
    pub min_profit_threshold: Decimal,
    /// Close once the spread in the position's direction is at or below this.
    pub convergence_threshold: Decimal,
    /// Close once the spread has widened this much past entry.
    pub stop_loss_threshold: Decimal,
    /// Close after holding this long, in seconds.
    pub max_holding_secs: u64,
    /// Notional per hedge in quote currency; size is `position_size / long price`.
    pub position_size: Decimal,
    /// Starting ledger balance.
    pub initial_balance: Decimal,
    /// Maximum number of hedges held at once.
    pub max_open_positions: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            supported_pairs: ["BTC/USDT", "ETH/USDT", "BNB/USDT", "ADA/USDT", "DOT/USDT"]
                .into_iter()
                .map(AssetId::from)
                .collect(),
            min_profit_threshold: Decimal::new(2, 3),  // 0.2%
            convergence_threshold: Decimal::new(5, 4), // 0.05%
            stop_loss_threshold: Decimal::new(1, 2),   // 1%
            max_holding_secs: 3600,
            position_size: Decimal::from(1000),
            initial_balance: Decimal::from(10000),
            max_open_positions: 1,
        }
    }
}
