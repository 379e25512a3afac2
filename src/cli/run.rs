//! Handler for the `run` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::info;

use crate::adapter::SimulatedVenue;
use crate::app::{Config, Engine};
use crate::cli::{report, RunArgs, DEFAULT_CONFIG};
use crate::domain::VenueSide;
use crate::error::Result;
use crate::port::{Clock, IntervalTicker, LogNotifier, NotifierRegistry, SystemClock};

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config.validate()?;
    config.init_logging();

    let seed = config.simulation.seed;
    info!(
        venue_a = %config.venues.a.name,
        venue_b = %config.venues.b.name,
        seed = ?seed,
        max_cycles = ?config.simulation.max_cycles,
        "hedgelord starting"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let venue_a = SimulatedVenue::new(VenueSide::A, &config.venues.a, Arc::clone(&clock), seed);
    let venue_b = SimulatedVenue::new(
        VenueSide::B,
        &config.venues.b,
        Arc::clone(&clock),
        seed.map(|s| s.wrapping_add(1)),
    );

    let mut notifiers = NotifierRegistry::new();
    notifiers.register(Box::new(LogNotifier));

    let mut engine = Engine::new(
        &config,
        Arc::new(venue_a),
        Arc::new(venue_b),
        clock,
        notifiers,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut ticker = IntervalTicker::new(config.simulation.interval());
    engine
        .run(&mut ticker, shutdown_rx, config.simulation.max_cycles)
        .await;

    let summary = engine.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        report::print(&summary);
    }

    info!("hedgelord stopped");
    Ok(())
}

/// Load the given file, or `config.toml` if present, or the defaults.
#[allow(clippy::result_large_err)]
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if default.exists() {
                Config::load(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(max_cycles) = args.max_cycles {
        config.simulation.max_cycles = Some(max_cycles);
    }
    if let Some(interval_ms) = args.interval_ms {
        config.simulation.interval_ms = interval_ms;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(min_profit) = args.min_profit {
        config.trading.min_profit_threshold = min_profit;
    }
    if args.close_on_exit {
        config.simulation.close_on_exit = true;
    }
}
