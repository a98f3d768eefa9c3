use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::{ChainId, ProtocolId};

/// Configuration-related errors with structured variants.
///
/// These are fatal at startup: the engine must not run against an invalid
/// fee table or risk surface.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Cost-model errors.
#[derive(Error, Debug, Clone)]
pub enum CostError {
    /// The destination chain has no configured fee rule.
    #[error("no fee rule configured for chain {chain}")]
    UnknownChain { chain: ChainId },

    /// The destination protocol is not in the reference registry.
    #[error("no registry entry for protocol {protocol}")]
    UnknownProtocol { protocol: ProtocolId },
}

/// Degraded-path conditions raised during a decision cycle.
///
/// These surface on audit records and logs; the epoch itself falls back
/// to `Hold` rather than aborting.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("forecasts missing for held protocols: {missing:?}")]
    IncompleteForecast { missing: Vec<ProtocolId> },

    #[error("no candidate allocation satisfies risk limit {risk_limit}")]
    RiskInfeasible { risk_limit: Decimal },

    #[error("trade costs {required} exceed available capital {available}")]
    InsufficientCapital {
        required: Decimal,
        available: Decimal,
    },
}

/// External data provider errors.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The provider did not answer within its deadline.
    #[error("provider query timed out: {0}")]
    Timeout(String),

    /// The provider answered with a failure.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Cost(#[from] CostError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
