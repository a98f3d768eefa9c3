//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors and other methods
//! that validate domain rules, such as allocation normalization and trade
//! construction.

use rust_decimal::Decimal;
use thiserror::Error;

use super::id::ProtocolId;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    /// Allocation fractions must be non-negative.
    #[error("allocation fraction for {protocol} must be non-negative, got {fraction}")]
    NegativeFraction {
        /// Protocol whose fraction is invalid.
        protocol: ProtocolId,
        /// The invalid fraction.
        fraction: Decimal,
    },

    /// Deployed allocation fractions must sum to 1 within tolerance.
    #[error("allocation fractions must sum to 1, got {sum}")]
    UnnormalizedAllocation {
        /// The actual sum of fractions.
        sum: Decimal,
    },

    /// Trade amounts must be positive.
    #[error("trade amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The invalid amount that was provided.
        amount: Decimal,
    },

    /// Trade cost estimates cannot be negative.
    #[error("estimated cost must be non-negative, got {cost}")]
    NegativeCost {
        /// The invalid cost that was provided.
        cost: Decimal,
    },

    /// Portfolio capital cannot be negative.
    #[error("total capital must be non-negative, got {capital}")]
    NegativeCapital {
        /// The invalid capital that was provided.
        capital: Decimal,
    },

    /// Protocol is not present in the reference registry.
    #[error("unknown protocol: {protocol}")]
    UnknownProtocol {
        /// The protocol that was looked up.
        protocol: ProtocolId,
    },
}
