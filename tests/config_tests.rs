use std::io::Write;
use std::path::PathBuf;

use hedgelord::app::Config;
use hedgelord::domain::AssetId;
use hedgelord::error::{ConfigError, Error};
use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

fn invalid_field(result: hedgelord::error::Result<Config>) -> &'static str {
    match result {
        Err(Error::Config(ConfigError::InvalidValue { field, .. })) => field,
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn shipped_config_is_valid() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let config = Config::load(&path).expect("load shipped config.toml");

    assert_eq!(config.trading.supported_pairs.len(), 5);
    assert_eq!(config.trading.min_profit_threshold, dec!(0.002));
    assert_eq!(config.venues.a.assets.len(), 6);
    assert_eq!(config.venues.b.assets.len(), 5);
    assert_eq!(
        config.venues.b.new_listing.as_ref().map(|l| l.asset.clone()),
        Some(AssetId::from("SOL/USDT"))
    );
    assert_eq!(
        config.venues.a.assets[&AssetId::from("ADA/USDT")].price,
        dec!(0.50)
    );
}

#[test]
fn load_reads_file_from_disk() {
    let file = write_temp_config(
        r#"
[trading]
supported_pairs = ["BTC/USDT"]
position_size = 500

[simulation]
max_cycles = 10
seed = 7
"#,
    );
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.trading.supported_pairs, vec![AssetId::from("BTC/USDT")]);
    assert_eq!(config.trading.position_size, dec!(500));
    assert_eq!(config.simulation.max_cycles, Some(10));
    assert_eq!(config.simulation.seed, Some(7));
}

#[test]
fn missing_file_is_read_error() {
    let result = Config::load("/nonexistent/hedgelord/config.toml");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[test]
fn malformed_toml_is_parse_error() {
    let file = write_temp_config("[trading\nposition_size = ");
    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn rejects_negative_position_size() {
    let file = write_temp_config("[trading]\nposition_size = -5\n");
    assert_eq!(invalid_field(Config::load(file.path())), "position_size");
}

#[test]
fn rejects_convergence_above_stop_loss() {
    let file = write_temp_config(
        "[trading]\nconvergence_threshold = 0.02\nstop_loss_threshold = 0.01\n",
    );
    assert_eq!(
        invalid_field(Config::load(file.path())),
        "convergence_threshold"
    );
}

#[test]
fn rejects_failure_rate_above_one() {
    let file = write_temp_config("[venues.a]\nname = \"OKX\"\nfailure_rate = 1.5\n");
    assert_eq!(invalid_field(Config::load(file.path())), "failure_rate");
}

#[test]
fn rejects_same_venue_names() {
    let file = write_temp_config("[venues.a]\nname = \"XT\"\n\n[venues.b]\nname = \"XT\"\n");
    assert_eq!(invalid_field(Config::load(file.path())), "venues");
}

#[test]
fn rejects_zero_interval() {
    let file = write_temp_config("[simulation]\ninterval_ms = 0\n");
    assert_eq!(invalid_field(Config::load(file.path())), "interval_ms");
}

#[test]
fn empty_pairs_is_missing_field() {
    let file = write_temp_config("[trading]\nsupported_pairs = []\n");
    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Config(ConfigError::MissingField {
            field: "supported_pairs"
        }))
    ));
}
