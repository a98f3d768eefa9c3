#![allow(dead_code)]

//! Shared fixtures for integration tests.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use yieldpilot::cost::{CostModel, FeeRule, FeeTable};
use yieldpilot::domain::{
    AllocationVector, ChainId, ForecastedYield, PortfolioState, Protocol, ProtocolId,
    ProtocolRegistry, RiskTier, StablecoinBacking, YieldObservation,
};

/// Two protocols on two chains. Chain B carries a kinked fee rule:
/// $2 fixed gas, zero slippage below a $10k liquidity threshold.
pub fn two_protocol_cost_model() -> CostModel {
    let registry: ProtocolRegistry = [
        Protocol::new(
            "proto-a",
            "chain-a",
            StablecoinBacking::Fiat,
            RiskTier::Established,
        ),
        Protocol::new(
            "proto-b",
            "chain-b",
            StablecoinBacking::Fiat,
            RiskTier::Established,
        ),
    ]
    .into_iter()
    .collect();

    let fees = FeeTable::try_new(
        [
            (
                ChainId::from("chain-a"),
                FeeRule::Flat { fixed_gas: dec!(2) },
            ),
            (
                ChainId::from("chain-b"),
                FeeRule::GasPlusSlippage {
                    fixed_gas: dec!(2),
                    slippage_bps: Decimal::ZERO,
                    liquidity_threshold: dec!(10_000),
                    surcharge_multiplier: dec!(2),
                },
            ),
        ]
        .into_iter()
        .collect(),
    )
    .expect("fixture fee table is valid");

    CostModel::new(fees, registry)
}

pub fn forecast(protocol: &str, apy: Decimal, uncertainty: Decimal) -> ForecastedYield {
    ForecastedYield {
        protocol: ProtocolId::from(protocol),
        epoch: 0,
        horizon: 1,
        expected_apy: apy,
        uncertainty,
    }
}

pub fn observation(protocol: &str, epoch: u64, apy: Decimal) -> YieldObservation {
    YieldObservation {
        protocol: ProtocolId::from(protocol),
        epoch,
        observed_at: Utc::now(),
        base_apy: apy,
        reward_apy: Decimal::ZERO,
        tvl: dec!(1_000_000),
        trailing_volatility: dec!(0.01),
    }
}

/// A portfolio fully deployed into one protocol.
pub fn all_in(protocol: &str, capital: Decimal) -> PortfolioState {
    PortfolioState::with_allocation(capital, AllocationVector::single(ProtocolId::from(protocol)))
        .expect("fixture state is valid")
}
