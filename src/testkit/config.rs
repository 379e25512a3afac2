//! Canonical test configuration.

use rust_decimal::Decimal;

use crate::app::config::Config;
use crate::domain::AssetId;

/// Defaults with test-friendly numbers: a large balance, one hedge at a
/// time, a three-failure breaker and a short quote timeout.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.trading.supported_pairs = vec![AssetId::from("BTC/USDT"), AssetId::from("ETH/USDT")];
    config.trading.initial_balance = Decimal::from(100_000);
    config.trading.position_size = Decimal::from(6000);
    config.simulation.quote_timeout_ms = 50;
    config.simulation.interval_ms = 10;
    config.health.max_failures = 3;
    config
}
