//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Every section is optional and
//! falls back to defaults that reproduce a two-venue simulation out of the
//! box.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

// Submodules
mod health;
mod logging;
mod simulation;
mod trading;
mod venue;

// Re-export all public types from submodules
pub use health::HealthConfig;
pub use logging::LoggingConfig;
pub use simulation::SimulationConfig;
pub use trading::TradingConfig;
pub use venue::{AssetConfig, ListingConfig, VenueConfig, VenuesConfig};

/// Upper bound for any duration given in seconds.
const MAX_SECS: u64 = 7 * 24 * 3600;

/// Convert a validated second count into a chrono duration.
pub(crate) fn secs(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(value.min(MAX_SECS)).unwrap_or(0))
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub venues: VenuesConfig,
}

impl Config {
    /// Read, parse and validate a TOML config file.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML config text.
    #[allow(clippy::result_large_err)]
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        self.validate_trading()?;
        self.validate_simulation()?;
        self.validate_health()?;
        for venue in [&self.venues.a, &self.venues.b] {
            validate_venue(venue)?;
        }
        if self.venues.a.name == self.venues.b.name {
            return Err(ConfigError::invalid("venues", "venue names must differ").into());
        }
        Ok(())
    }

    fn validate_trading(&self) -> std::result::Result<(), ConfigError> {
        let trading = &self.trading;
        if trading.supported_pairs.is_empty() {
            return Err(ConfigError::MissingField {
                field: "supported_pairs",
            });
        }
        if trading.min_profit_threshold < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "min_profit_threshold",
                "must not be negative",
            ));
        }
        if trading.stop_loss_threshold <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "stop_loss_threshold",
                "must be positive",
            ));
        }
        if trading.convergence_threshold >= trading.stop_loss_threshold {
            return Err(ConfigError::invalid(
                "convergence_threshold",
                "must be below stop_loss_threshold",
            ));
        }
        if trading.max_holding_secs == 0 || trading.max_holding_secs > MAX_SECS {
            return Err(ConfigError::invalid(
                "max_holding_secs",
                format!("must be between 1 and {MAX_SECS}"),
            ));
        }
        if trading.position_size <= Decimal::ZERO {
            return Err(ConfigError::invalid("position_size", "must be positive"));
        }
        if trading.initial_balance <= Decimal::ZERO {
            return Err(ConfigError::invalid("initial_balance", "must be positive"));
        }
        if trading.max_open_positions == 0 {
            return Err(ConfigError::invalid(
                "max_open_positions",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    fn validate_simulation(&self) -> std::result::Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.interval_ms == 0 {
            return Err(ConfigError::invalid("interval_ms", "must be positive"));
        }
        if sim.quote_timeout_ms == 0 {
            return Err(ConfigError::invalid("quote_timeout_ms", "must be positive"));
        }
        if sim.staleness_secs == 0 || sim.staleness_secs > MAX_SECS {
            return Err(ConfigError::invalid(
                "staleness_secs",
                format!("must be between 1 and {MAX_SECS}"),
            ));
        }
        if sim.universe_refresh_cycles == 0 {
            return Err(ConfigError::invalid(
                "universe_refresh_cycles",
                "must be at least 1",
            ));
        }
        if sim.max_cycles == Some(0) {
            return Err(ConfigError::invalid("max_cycles", "must be at least 1"));
        }
        Ok(())
    }

    fn validate_health(&self) -> std::result::Result<(), ConfigError> {
        let health = &self.health;
        if health.window_secs == 0 || health.window_secs > MAX_SECS {
            return Err(ConfigError::invalid(
                "window_secs",
                format!("must be between 1 and {MAX_SECS}"),
            ));
        }
        if health.max_failures == 0 {
            return Err(ConfigError::invalid("max_failures", "must be at least 1"));
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn validate_venue(venue: &VenueConfig) -> std::result::Result<(), ConfigError> {
    if venue.name.trim().is_empty() {
        return Err(ConfigError::MissingField { field: "name" });
    }
    if venue.fee_rate < Decimal::ZERO || venue.fee_rate >= Decimal::ONE {
        return Err(ConfigError::invalid(
            "fee_rate",
            format!("{} is outside [0, 1)", venue.fee_rate),
        ));
    }
    if !(0.0..=1.0).contains(&venue.failure_rate) {
        return Err(ConfigError::invalid(
            "failure_rate",
            format!("{} is outside [0, 1]", venue.failure_rate),
        ));
    }
    let listing = venue
        .new_listing
        .iter()
        .map(|l| (&l.asset, l.price, l.volatility));
    for (asset, price, volatility) in venue
        .assets
        .iter()
        .map(|(id, a)| (id, a.price, a.volatility))
        .chain(listing)
    {
        if price <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "price",
                format!("{asset} on {} must be positive", venue.name),
            ));
        }
        if !(0.0..0.5).contains(&volatility) {
            return Err(ConfigError::invalid(
                "volatility",
                format!("{asset} on {} is outside [0, 0.5)", venue.name),
            ));
        }
    }
    Ok(())
}
