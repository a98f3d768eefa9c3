//! Configuration loading tests: file round-trip, defaults, and the
//! fatal-at-startup validation surface.

use std::io::Write;

use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

use yieldpilot::config::Config;
use yieldpilot::domain::{ProtocolId, Venue};
use yieldpilot::error::{ConfigError, Error};

const FULL_CONFIG: &str = r#"
[engine]
epochs_per_year = 365
freshness_window_secs = 86400
horizon = 1

[risk]
risk_limit = 0.05
min_improvement_threshold = 0.01
tie_break_tolerance = 0.005
tail_z = 1.65

[logging]
level = "warn"
format = "json"

[fees.ethereum]
rule = "gas_plus_slippage"
fixed_gas = 12.0
slippage_bps = 5
liquidity_threshold = 100000
surcharge_multiplier = 3

[fees.arbitrum]
rule = "gas_plus_slippage"
fixed_gas = 0.30
slippage_bps = 5
liquidity_threshold = 50000

[fees.base]
rule = "flat"
fixed_gas = 0.05

[protocols.aave-v3]
chain = "ethereum"
backing = "fiat"
tier = "established"

[protocols.morpho-blue]
chain = "ethereum"
backing = "crypto"
tier = "ecosystem"

[protocols.radiant]
chain = "arbitrum"
backing = "fiat"
tier = "emerging"

[protocols.moonwell]
chain = "base"
backing = "fiat"
tier = "emerging"
"#;

#[test]
fn loads_full_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FULL_CONFIG.as_bytes()).unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.fees.len(), 3);
    assert_eq!(config.protocols.len(), 4);
    assert_eq!(config.freshness_window(), chrono::Duration::hours(24));

    let settings = config.optimizer_settings();
    assert_eq!(settings.risk_limit, dec!(0.05));
    assert_eq!(settings.epochs_per_year, dec!(365));
}

#[test]
fn cost_model_built_from_config_prices_trades() {
    let config = Config::from_toml(FULL_CONFIG).unwrap();
    let model = config.cost_model().unwrap();

    // $10k into a base protocol: flat nickel of gas.
    let cost = model
        .estimate(
            &Venue::IdleCash,
            &ProtocolId::from("moonwell"),
            dec!(10_000),
            dec!(10_000),
        )
        .unwrap();
    assert_eq!(cost, dec!(0.05));

    // $10k into an ethereum protocol: $12 gas + 5bps of 10k = $17.
    let cost = model
        .estimate(
            &Venue::IdleCash,
            &ProtocolId::from("aave-v3"),
            dec!(10_000),
            dec!(10_000),
        )
        .unwrap();
    assert_eq!(cost, dec!(17));
}

#[test]
fn missing_file_is_a_read_error() {
    let result = Config::load("/nonexistent/yieldpilot.toml");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let result = Config::from_toml("[fees.ethereum\nrule = ");
    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}

#[test]
fn surcharge_below_one_is_rejected() {
    let toml = r#"
        [fees.ethereum]
        rule = "gas_plus_slippage"
        fixed_gas = 12.0
        slippage_bps = 5
        liquidity_threshold = 100000
        surcharge_multiplier = 0.5
    "#;
    let result = Config::from_toml(toml);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn negative_tie_break_tolerance_is_rejected() {
    let toml = r#"
        [risk]
        tie_break_tolerance = -0.001
    "#;
    assert!(Config::from_toml(toml).is_err());
}

#[test]
fn non_positive_freshness_window_is_rejected() {
    let toml = r#"
        [engine]
        freshness_window_secs = 0
    "#;
    assert!(Config::from_toml(toml).is_err());
}

#[test]
fn unconfigured_protocol_surfaces_at_cost_time() {
    // Validation ties every registry entry to a configured chain, so the
    // only way to reach the cost model with a hole is an unregistered
    // protocol - and that is an error, not a silent zero cost.
    let config = Config::from_toml(FULL_CONFIG).unwrap();
    let model = config.cost_model().unwrap();
    let result = model.estimate(
        &Venue::IdleCash,
        &ProtocolId::from("solend"),
        dec!(100),
        dec!(100),
    );
    assert!(result.is_err());
    assert!(model.registry().chain_of(&ProtocolId::from("solend")).is_err());
}
