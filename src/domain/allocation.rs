//! Capital allocation vectors.
//!
//! An [`AllocationVector`] maps protocols to fractions of total capital.
//! Deployed vectors must have non-negative fractions summing to 1 within
//! [`FRACTION_TOLERANCE`]; the empty vector denotes a fully idle portfolio
//! (capital held as cash, not yet deployed).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::ProtocolId;

/// Tolerance on the sum-to-one invariant for deployed allocations.
pub const FRACTION_TOLERANCE: Decimal = dec!(0.000001);

/// Mapping from protocol to fraction of total capital.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllocationVector {
    fractions: BTreeMap<ProtocolId, Decimal>,
}

impl AllocationVector {
    /// The fully idle allocation: no capital deployed to any protocol.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Create a validated allocation vector.
    ///
    /// Fractions must be non-negative and sum to 1 within
    /// [`FRACTION_TOLERANCE`]. Zero-fraction entries are dropped. An empty
    /// map yields the idle allocation.
    pub fn try_new(fractions: BTreeMap<ProtocolId, Decimal>) -> Result<Self, DomainError> {
        if fractions.is_empty() {
            return Ok(Self::idle());
        }

        for (protocol, fraction) in &fractions {
            if *fraction < Decimal::ZERO {
                return Err(DomainError::NegativeFraction {
                    protocol: protocol.clone(),
                    fraction: *fraction,
                });
            }
        }

        let sum: Decimal = fractions.values().copied().sum();
        if (sum - Decimal::ONE).abs() > FRACTION_TOLERANCE {
            return Err(DomainError::UnnormalizedAllocation { sum });
        }

        let fractions = fractions
            .into_iter()
            .filter(|(_, f)| *f > Decimal::ZERO)
            .collect();
        Ok(Self { fractions })
    }

    /// An allocation fully concentrated in one protocol.
    #[must_use]
    pub fn single(protocol: ProtocolId) -> Self {
        let mut fractions = BTreeMap::new();
        fractions.insert(protocol, Decimal::ONE);
        Self { fractions }
    }

    /// Clamp raw fractions to [0, 1] and renormalize to sum exactly 1.
    ///
    /// Corrects floating-point drift after optimization. If everything
    /// clamps to zero the result is the idle allocation. The largest sleeve
    /// absorbs the residual so the sum lands exactly on 1.
    #[must_use]
    pub fn clamp_and_renormalize(raw: BTreeMap<ProtocolId, Decimal>) -> Self {
        let clamped: BTreeMap<ProtocolId, Decimal> = raw
            .into_iter()
            .map(|(p, f)| (p, f.clamp(Decimal::ZERO, Decimal::ONE)))
            .filter(|(_, f)| *f > Decimal::ZERO)
            .collect();

        let sum: Decimal = clamped.values().copied().sum();
        if sum.is_zero() {
            return Self::idle();
        }

        let mut fractions: BTreeMap<ProtocolId, Decimal> = clamped
            .into_iter()
            .map(|(p, f)| (p, f / sum))
            .collect();

        // Division rounding can leave the sum a hair off 1.
        let drift: Decimal = Decimal::ONE - fractions.values().copied().sum::<Decimal>();
        if !drift.is_zero() {
            if let Some((_, largest)) = fractions
                .iter_mut()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            {
                *largest += drift;
            }
        }

        Self { fractions }
    }

    /// Fraction allocated to a protocol (zero when unheld).
    #[must_use]
    pub fn fraction(&self, protocol: &ProtocolId) -> Decimal {
        self.fractions
            .get(protocol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Iterate over (protocol, fraction) entries in sorted protocol order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProtocolId, &Decimal)> {
        self.fractions.iter()
    }

    /// Protocols holding a non-zero fraction, in sorted order.
    pub fn protocols(&self) -> Vec<ProtocolId> {
        self.fractions.keys().cloned().collect()
    }

    /// Sum of all fractions.
    #[must_use]
    pub fn sum(&self) -> Decimal {
        self.fractions.values().copied().sum()
    }

    /// Whether no capital is deployed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Number of protocols holding a non-zero fraction.
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// Check if the allocation holds no protocols.
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }
}
