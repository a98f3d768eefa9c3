//! Trade types.
//!
//! A [`Trade`] moves a dollar amount from a source venue (idle cash or a
//! protocol) into a destination protocol. Trades are ephemeral: produced
//! and consumed within one rebalancing decision, persisted only on the
//! epoch's audit record.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::ProtocolId;

/// Where capital is drawn from in a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    /// Undeployed cash, used when capital first enters the portfolio.
    IdleCash,
    /// An existing protocol position.
    Protocol(ProtocolId),
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::IdleCash => write!(f, "idle-cash"),
            Venue::Protocol(id) => write!(f, "{id}"),
        }
    }
}

/// A single capital movement within one rebalancing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Where the capital comes from.
    pub source: Venue,
    /// Protocol the capital moves into.
    pub destination: ProtocolId,
    /// Dollar amount moved.
    pub amount: Decimal,
    /// Estimated transaction cost (gas + slippage) in dollars.
    pub estimated_cost: Decimal,
}

impl Trade {
    /// Create a validated trade.
    ///
    /// The amount must be positive and the estimated cost non-negative.
    pub fn try_new(
        source: Venue,
        destination: ProtocolId,
        amount: Decimal,
        estimated_cost: Decimal,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount });
        }
        if estimated_cost < Decimal::ZERO {
            return Err(DomainError::NegativeCost {
                cost: estimated_cost,
            });
        }
        Ok(Self {
            source,
            destination,
            amount,
            estimated_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn try_new_builds_valid_trade() {
        let trade = Trade::try_new(
            Venue::Protocol(ProtocolId::from("aave-v3")),
            ProtocolId::from("compound-v3"),
            dec!(1000),
            dec!(2.50),
        )
        .unwrap();
        assert_eq!(trade.amount, dec!(1000));
        assert_eq!(trade.source.to_string(), "aave-v3");
    }

    #[test]
    fn try_new_rejects_non_positive_amount() {
        let result = Trade::try_new(
            Venue::IdleCash,
            ProtocolId::from("aave-v3"),
            Decimal::ZERO,
            dec!(1),
        );
        assert!(matches!(result, Err(DomainError::NonPositiveAmount { .. })));
    }

    #[test]
    fn try_new_rejects_negative_cost() {
        let result = Trade::try_new(
            Venue::IdleCash,
            ProtocolId::from("aave-v3"),
            dec!(100),
            dec!(-0.01),
        );
        assert!(matches!(result, Err(DomainError::NegativeCost { .. })));
    }

    #[test]
    fn idle_cash_displays_as_label() {
        assert_eq!(Venue::IdleCash.to_string(), "idle-cash");
    }
}
