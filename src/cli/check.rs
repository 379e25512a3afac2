//! Configuration validation command.

use std::path::Path;

use crate::app::config::VenueConfig;
use crate::app::Config;
use crate::cli::output;
use crate::error::Result;

/// Failure rates above this make a venue degrade most of the time.
const HIGH_FAILURE_RATE: f64 = 0.5;

/// Validate a configuration file without starting the simulation.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    output::note(&format!("Checking configuration: {}", path.display()));

    let config = Config::load(path)?;
    output::ok("Configuration file is valid");

    output::section("Summary");
    let trading = &config.trading;
    output::key_value("Venues", format!("{} / {}", config.venues.a.name, config.venues.b.name));
    output::key_value(
        "Default pairs",
        trading
            .supported_pairs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    );
    output::key_value("Min profit", output::percent(trading.min_profit_threshold));
    output::key_value("Convergence", output::percent(trading.convergence_threshold));
    output::key_value("Stop loss", output::percent(trading.stop_loss_threshold));
    output::key_value("Max holding", format!("{}s", trading.max_holding_secs));
    output::key_value("Position size", trading.position_size);
    output::key_value("Balance", trading.initial_balance);
    output::key_value("Interval", format!("{}ms", config.simulation.interval_ms));
    output::key_value(
        "Circuit breaker",
        format!(
            "{} failures in {}s",
            config.health.max_failures, config.health.window_secs
        ),
    );
    println!();

    let mut warnings = 0;
    for venue in [&config.venues.a, &config.venues.b] {
        warnings += check_venue(venue, &config);
    }
    if config.simulation.seed.is_none() {
        output::note("  No seed configured: runs are not reproducible");
    }

    println!();
    if warnings == 0 {
        output::note("Configuration is ready to use.");
    } else {
        output::note(&format!("Configuration is usable with {warnings} warning(s)."));
    }
    Ok(())
}

fn check_venue(venue: &VenueConfig, config: &Config) -> usize {
    let mut warnings = 0;
    if venue.failure_rate > HIGH_FAILURE_RATE {
        output::warn(&format!(
            "{}: failure rate {} will keep the venue degraded",
            venue.name, venue.failure_rate
        ));
        warnings += 1;
    }

    let unpriced: Vec<String> = config
        .trading
        .supported_pairs
        .iter()
        .filter(|asset| !venue.assets.contains_key(*asset))
        .map(ToString::to_string)
        .collect();
    if unpriced.is_empty() {
        output::ok(&format!("{}: every default pair is priced", venue.name));
    } else {
        output::warn(&format!(
            "{}: no price for {} (quotes for these fail)",
            venue.name,
            unpriced.join(", ")
        ));
        warnings += 1;
    }
    warnings
}
