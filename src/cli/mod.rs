//! Command-line interface definitions.

pub mod check;
pub mod output;
pub mod report;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Hedgelord - cross-venue spread arbitrage simulator.
#[derive(Parser, Debug)]
#[command(name = "hedgelord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulation loop
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `hedgelord check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file (built-in defaults if omitted and
    /// config.toml does not exist)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Stop after this many cycles
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Override delay between cycles in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Seed the simulated venues for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override minimum profit threshold
    #[arg(long)]
    pub min_profit: Option<Decimal>,

    /// Close open hedges at the last seen prices before exiting
    #[arg(long)]
    pub close_on_exit: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}
