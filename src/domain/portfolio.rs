//! Portfolio state.
//!
//! [`PortfolioState`] is the authoritative record of one portfolio: its
//! allocation, capital, and cumulative cost/return. It is owned by the
//! tracker and advanced once per epoch - there is no shared mutable
//! market-state singleton anywhere in the engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::allocation::AllocationVector;
use super::error::DomainError;

/// Authoritative state of one portfolio at one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Current epoch counter.
    pub epoch: u64,
    /// Current allocation across protocols (idle when empty).
    pub allocation: AllocationVector,
    /// Total capital in dollars.
    pub total_capital: Decimal,
    /// Sum of all realized transaction costs. Never decreases.
    pub cumulative_realized_cost: Decimal,
    /// Net return to date: accrued yield minus realized costs.
    pub cumulative_net_return: Decimal,
}

impl PortfolioState {
    /// Create a fresh portfolio at epoch 0 with all capital idle.
    pub fn new(total_capital: Decimal) -> Result<Self, DomainError> {
        if total_capital < Decimal::ZERO {
            return Err(DomainError::NegativeCapital {
                capital: total_capital,
            });
        }
        Ok(Self {
            epoch: 0,
            allocation: AllocationVector::idle(),
            total_capital,
            cumulative_realized_cost: Decimal::ZERO,
            cumulative_net_return: Decimal::ZERO,
        })
    }

    /// Create a portfolio with an existing deployed allocation.
    pub fn with_allocation(
        total_capital: Decimal,
        allocation: AllocationVector,
    ) -> Result<Self, DomainError> {
        let mut state = Self::new(total_capital)?;
        state.allocation = allocation;
        Ok(state)
    }

    /// Dollar value currently deployed to one protocol.
    #[must_use]
    pub fn deployed_to(&self, protocol: &super::id::ProtocolId) -> Decimal {
        self.total_capital * self.allocation.fraction(protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::ProtocolId;
    use rust_decimal_macros::dec;

    #[test]
    fn new_portfolio_starts_idle() {
        let state = PortfolioState::new(dec!(10_000)).unwrap();
        assert_eq!(state.epoch, 0);
        assert!(state.allocation.is_idle());
        assert_eq!(state.cumulative_realized_cost, Decimal::ZERO);
    }

    #[test]
    fn new_rejects_negative_capital() {
        let result = PortfolioState::new(dec!(-1));
        assert!(matches!(result, Err(DomainError::NegativeCapital { .. })));
    }

    #[test]
    fn deployed_to_scales_by_fraction() {
        let allocation = AllocationVector::try_new(
            [
                (ProtocolId::from("aave-v3"), dec!(0.25)),
                (ProtocolId::from("compound-v3"), dec!(0.75)),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap();
        let state = PortfolioState::with_allocation(dec!(10_000), allocation).unwrap();
        assert_eq!(state.deployed_to(&ProtocolId::from("aave-v3")), dec!(2500));
        assert_eq!(state.deployed_to(&ProtocolId::from("spark")), Decimal::ZERO);
    }
}
