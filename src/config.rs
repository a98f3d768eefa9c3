//! Configuration loading and validation.
//!
//! Everything tunable lives in one TOML file: the per-chain fee table,
//! the protocol registry, the risk surface, and logging. Validation is
//! fatal at load time - the engine must not run against a negative
//! slippage rate or a fee table with holes in it.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::cost::{CostModel, FeeRule, FeeTable};
use crate::domain::{ChainId, Protocol, ProtocolRegistry, RiskTier, StablecoinBacking};
use crate::error::{ConfigError, Error, Result};
use crate::optimizer::OptimizerSettings;

fn default_epochs_per_year() -> Decimal {
    dec!(365)
}

fn default_freshness_window_secs() -> i64 {
    86_400
}

fn default_horizon() -> u32 {
    1
}

fn default_risk_limit() -> Decimal {
    dec!(0.05)
}

fn default_min_improvement_threshold() -> Decimal {
    dec!(0.01)
}

fn default_tie_break_tolerance() -> Decimal {
    dec!(0.005)
}

fn default_tail_z() -> Decimal {
    dec!(1.65)
}

/// Epoch cadence and data freshness settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Epochs per year, for scaling APY to per-epoch returns.
    #[serde(default = "default_epochs_per_year")]
    pub epochs_per_year: Decimal,
    /// Observations older than this are treated as absent.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: i64,
    /// Forecast horizon in epochs.
    #[serde(default = "default_horizon")]
    pub horizon: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epochs_per_year: default_epochs_per_year(),
            freshness_window_secs: default_freshness_window_secs(),
            horizon: default_horizon(),
        }
    }
}

/// Risk and no-trade-region settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Maximum tolerated tail loss, annualized fraction of capital.
    #[serde(default = "default_risk_limit")]
    pub risk_limit: Decimal,
    /// Minimum net dollar gain per epoch required to trade.
    #[serde(default = "default_min_improvement_threshold")]
    pub min_improvement_threshold: Decimal,
    /// Net-gain window (dollars) within which candidates count as tied.
    #[serde(default = "default_tie_break_tolerance")]
    pub tie_break_tolerance: Decimal,
    /// Quantile multiplier on forecast uncertainty for the tail proxy.
    #[serde(default = "default_tail_z")]
    pub tail_z: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_limit: default_risk_limit(),
            min_improvement_threshold: default_min_improvement_threshold(),
            tie_break_tolerance: default_tie_break_tolerance(),
            tail_z: default_tail_z(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// One protocol entry in the configured registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    /// Chain the protocol settles on.
    pub chain: String,
    /// Backing class of the deposited stablecoin.
    pub backing: StablecoinBacking,
    /// Coarse risk tier.
    pub tier: RiskTier,
}

/// Main engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Fee table: chain name to fee rule.
    #[serde(default)]
    pub fees: BTreeMap<String, FeeRule>,
    /// Protocol registry: protocol ID to reference data.
    #[serde(default)]
    pub protocols: BTreeMap<String, ProtocolConfig>,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.epochs_per_year <= Decimal::ZERO {
            return Err(invalid(
                "engine.epochs_per_year",
                format!("must be positive, got {}", self.engine.epochs_per_year),
            ));
        }
        if self.engine.freshness_window_secs <= 0 {
            return Err(invalid(
                "engine.freshness_window_secs",
                format!("must be positive, got {}", self.engine.freshness_window_secs),
            ));
        }
        if self.risk.risk_limit <= Decimal::ZERO {
            return Err(invalid(
                "risk.risk_limit",
                format!("must be positive, got {}", self.risk.risk_limit),
            ));
        }
        if self.risk.min_improvement_threshold < Decimal::ZERO {
            return Err(invalid(
                "risk.min_improvement_threshold",
                format!(
                    "must be non-negative, got {}",
                    self.risk.min_improvement_threshold
                ),
            ));
        }
        if self.risk.tie_break_tolerance < Decimal::ZERO {
            return Err(invalid(
                "risk.tie_break_tolerance",
                format!("must be non-negative, got {}", self.risk.tie_break_tolerance),
            ));
        }
        if self.risk.tail_z <= Decimal::ZERO {
            return Err(invalid(
                "risk.tail_z",
                format!("must be positive, got {}", self.risk.tail_z),
            ));
        }

        for (chain, rule) in &self.fees {
            rule.validate(chain)?;
        }

        for (protocol, entry) in &self.protocols {
            if !self.fees.contains_key(&entry.chain) {
                return Err(invalid(
                    format!("protocols.{protocol}.chain"),
                    format!("chain '{}' has no fee rule", entry.chain),
                ));
            }
        }

        Ok(())
    }

    /// Initialize the global tracing subscriber from the logging section.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }

    /// Optimizer settings derived from this configuration.
    #[must_use]
    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            risk_limit: self.risk.risk_limit,
            min_improvement_threshold: self.risk.min_improvement_threshold,
            tie_break_tolerance: self.risk.tie_break_tolerance,
            tail_z: self.risk.tail_z,
            epochs_per_year: self.engine.epochs_per_year,
        }
    }

    /// Freshness window as a duration.
    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        Duration::seconds(self.engine.freshness_window_secs)
    }

    /// Build the validated cost model from the fee table and registry.
    pub fn cost_model(&self) -> Result<CostModel> {
        let fees = FeeTable::try_new(
            self.fees
                .iter()
                .map(|(chain, rule)| (ChainId::from(chain.clone()), rule.clone()))
                .collect(),
        )
        .map_err(Error::Config)?;
        let registry: ProtocolRegistry = self
            .protocols
            .iter()
            .map(|(id, entry)| {
                Protocol::new(id.clone(), entry.chain.clone(), entry.backing, entry.tier)
            })
            .collect();
        Ok(CostModel::new(fees, registry))
    }
}

fn invalid(field: impl Into<String>, reason: String) -> Error {
    Error::Config(ConfigError::InvalidValue {
        field: field.into(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const VALID: &str = r#"
        [engine]
        epochs_per_year = 365
        freshness_window_secs = 86400

        [risk]
        risk_limit = 0.05
        min_improvement_threshold = 0.01

        [logging]
        level = "debug"

        [fees.ethereum]
        rule = "gas_plus_slippage"
        fixed_gas = 12.0
        slippage_bps = 5
        liquidity_threshold = 100000
        surcharge_multiplier = 3

        [fees.base]
        rule = "flat"
        fixed_gas = 0.05

        [protocols.aave-v3]
        chain = "ethereum"
        backing = "fiat"
        tier = "established"

        [protocols.moonwell]
        chain = "base"
        backing = "fiat"
        tier = "emerging"
    "#;

    #[test]
    fn valid_config_parses() {
        let config = Config::from_toml(VALID).unwrap();
        assert_eq!(config.engine.epochs_per_year, dec!(365));
        assert_eq!(config.fees.len(), 2);
        assert_eq!(config.protocols.len(), 2);

        let model = config.cost_model().unwrap();
        assert_eq!(model.registry().len(), 2);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.risk.risk_limit, dec!(0.05));
        assert_eq!(config.engine.horizon, 1);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn negative_slippage_is_rejected() {
        let toml = r#"
            [fees.ethereum]
            rule = "gas_plus_slippage"
            fixed_gas = 12.0
            slippage_bps = -5
            liquidity_threshold = 100000
        "#;
        let result = Config::from_toml(toml);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let toml = r#"
            [fees.ethereum]
            rule = "gas_plus_slippage"
            fixed_gas = 12.0
            slippage_bps = 5
            liquidity_threshold = 0
        "#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn protocol_on_unconfigured_chain_is_rejected() {
        let toml = r#"
            [protocols.solend]
            chain = "solana"
            backing = "fiat"
            tier = "emerging"
        "#;
        let result = Config::from_toml(toml);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn non_positive_risk_limit_is_rejected() {
        let toml = r#"
            [risk]
            risk_limit = 0
        "#;
        assert!(Config::from_toml(toml).is_err());
    }
}
