//! Transaction cost model.
//!
//! Costs in this domain are neither purely fixed nor purely proportional:
//! gas is near-fixed per chain, slippage is proportional below a chain's
//! liquidity threshold and steeper above it. The kink is what creates a
//! no-trade region - for small portfolios a few dollars of gas swamps any
//! plausible yield pickup, and the optimizer must see that explicitly.
//!
//! Fee mechanics are a tagged [`FeeRule`] per chain so chain-specific
//! variants can be added without touching the optimizer's contract.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::{ChainId, ProtocolId, ProtocolRegistry, Venue};
use crate::error::{ConfigError, CostError};

fn default_surcharge_multiplier() -> Decimal {
    dec!(2)
}

/// Fee mechanics for one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FeeRule {
    /// Fixed gas only, no slippage (deep-liquidity chains or test setups).
    Flat {
        /// Fixed gas cost per transaction, in dollars.
        fixed_gas: Decimal,
    },
    /// Fixed gas plus basis-point slippage, with a surcharge on the
    /// portion of a trade above the liquidity threshold.
    GasPlusSlippage {
        /// Fixed gas cost per transaction, in dollars.
        fixed_gas: Decimal,
        /// Slippage rate in basis points of trade amount.
        slippage_bps: Decimal,
        /// Trade size (dollars) above which slippage steepens.
        liquidity_threshold: Decimal,
        /// Multiplier on the slippage rate past the threshold. Must be >= 1.
        #[serde(default = "default_surcharge_multiplier")]
        surcharge_multiplier: Decimal,
    },
}

impl FeeRule {
    /// Validate the rule's parameters at load time.
    pub fn validate(&self, chain: &str) -> Result<(), ConfigError> {
        match self {
            FeeRule::Flat { fixed_gas } => {
                if *fixed_gas < Decimal::ZERO {
                    return Err(ConfigError::InvalidValue {
                        field: format!("fees.{chain}.fixed_gas"),
                        reason: format!("must be non-negative, got {fixed_gas}"),
                    });
                }
            }
            FeeRule::GasPlusSlippage {
                fixed_gas,
                slippage_bps,
                liquidity_threshold,
                surcharge_multiplier,
            } => {
                if *fixed_gas < Decimal::ZERO {
                    return Err(ConfigError::InvalidValue {
                        field: format!("fees.{chain}.fixed_gas"),
                        reason: format!("must be non-negative, got {fixed_gas}"),
                    });
                }
                if *slippage_bps < Decimal::ZERO {
                    return Err(ConfigError::InvalidValue {
                        field: format!("fees.{chain}.slippage_bps"),
                        reason: format!("must be non-negative, got {slippage_bps}"),
                    });
                }
                if *liquidity_threshold <= Decimal::ZERO {
                    return Err(ConfigError::InvalidValue {
                        field: format!("fees.{chain}.liquidity_threshold"),
                        reason: format!("must be positive, got {liquidity_threshold}"),
                    });
                }
                if *surcharge_multiplier < Decimal::ONE {
                    return Err(ConfigError::InvalidValue {
                        field: format!("fees.{chain}.surcharge_multiplier"),
                        reason: format!("must be at least 1, got {surcharge_multiplier}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Cost of moving `amount` dollars under this rule.
    #[must_use]
    pub fn cost(&self, amount: Decimal) -> Decimal {
        const BPS_SCALE: Decimal = dec!(10000);

        match self {
            FeeRule::Flat { fixed_gas } => *fixed_gas,
            FeeRule::GasPlusSlippage {
                fixed_gas,
                slippage_bps,
                liquidity_threshold,
                surcharge_multiplier,
            } => {
                let below = amount.min(*liquidity_threshold);
                let above = (amount - *liquidity_threshold).max(Decimal::ZERO);
                *fixed_gas
                    + below * *slippage_bps / BPS_SCALE
                    + above * *slippage_bps * *surcharge_multiplier / BPS_SCALE
            }
        }
    }
}

/// Static fee table, chain ID to fee rule.
#[derive(Debug, Clone, Default)]
pub struct FeeTable {
    rules: BTreeMap<ChainId, FeeRule>,
}

impl FeeTable {
    /// Build a fee table, validating every rule.
    pub fn try_new(rules: BTreeMap<ChainId, FeeRule>) -> Result<Self, ConfigError> {
        for (chain, rule) in &rules {
            rule.validate(chain.as_str())?;
        }
        Ok(Self { rules })
    }

    /// Look up the fee rule for a chain.
    pub fn rule(&self, chain: &ChainId) -> Result<&FeeRule, CostError> {
        self.rules.get(chain).ok_or_else(|| CostError::UnknownChain {
            chain: chain.clone(),
        })
    }

    /// Number of configured chains.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Estimates the discrete transaction cost of a proposed capital movement.
///
/// Pure function of its inputs and the static fee table; the model holds
/// the protocol registry only to resolve a destination's chain.
#[derive(Debug, Clone)]
pub struct CostModel {
    fees: FeeTable,
    registry: ProtocolRegistry,
}

impl CostModel {
    /// Create a cost model over a validated fee table and protocol registry.
    pub fn new(fees: FeeTable, registry: ProtocolRegistry) -> Self {
        Self { fees, registry }
    }

    /// The protocol registry backing this model.
    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    /// Estimate the cost of moving `amount` dollars into `destination`.
    ///
    /// `portfolio_size` caps the billable amount - a trade cannot move
    /// more than the portfolio holds. The source venue does not affect
    /// cost under the current rules: gas and slippage are charged on the
    /// destination chain.
    pub fn estimate(
        &self,
        _source: &Venue,
        destination: &ProtocolId,
        amount: Decimal,
        portfolio_size: Decimal,
    ) -> Result<Decimal, CostError> {
        let protocol =
            self.registry
                .get(destination)
                .ok_or_else(|| CostError::UnknownProtocol {
                    protocol: destination.clone(),
                })?;
        let rule = self.fees.rule(&protocol.chain)?;
        Ok(rule.cost(amount.min(portfolio_size)))
    }
}
