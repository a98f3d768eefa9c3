//! Forecasted yields.
//!
//! Forecasts come from an external provider and are consumed read-only.
//! The output contract is a point estimate plus a non-negative uncertainty
//! scalar per protocol, enough for the optimizer's tail-risk proxy.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::allocation::AllocationVector;
use super::id::ProtocolId;

/// Predicted yield for one protocol over a forward horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastedYield {
    /// Protocol the forecast applies to.
    pub protocol: ProtocolId,
    /// Epoch the forecast was produced at.
    pub epoch: u64,
    /// Forward horizon in epochs.
    pub horizon: u32,
    /// Expected total APY over the horizon, as a fraction.
    pub expected_apy: Decimal,
    /// Uncertainty scalar around the expectation (same units as APY).
    pub uncertainty: Decimal,
}

/// A set of forecasts for one decision cycle, keyed by protocol.
///
/// When the same protocol appears more than once the later entry wins;
/// providers are expected to emit one forecast per protocol per cycle.
#[derive(Debug, Clone, Default)]
pub struct ForecastSet {
    by_protocol: BTreeMap<ProtocolId, ForecastedYield>,
}

impl ForecastSet {
    /// Create an empty forecast set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the forecast for a protocol.
    pub fn get(&self, protocol: &ProtocolId) -> Option<&ForecastedYield> {
        self.by_protocol.get(protocol)
    }

    /// Protocols this set has forecasts for, in sorted order.
    pub fn protocols(&self) -> Vec<ProtocolId> {
        self.by_protocol.keys().cloned().collect()
    }

    /// Protocols holding a non-zero fraction of the allocation but
    /// missing from this set.
    ///
    /// A non-empty result means the optimizer must not trade: it would
    /// be pricing sleeves it has no view on.
    pub fn missing_for(&self, allocation: &AllocationVector) -> Vec<ProtocolId> {
        allocation
            .iter()
            .filter(|(protocol, fraction)| {
                **fraction > Decimal::ZERO && !self.by_protocol.contains_key(protocol)
            })
            .map(|(protocol, _)| protocol.clone())
            .collect()
    }

    /// Number of forecasts in the set.
    pub fn len(&self) -> usize {
        self.by_protocol.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.by_protocol.is_empty()
    }
}

impl FromIterator<ForecastedYield> for ForecastSet {
    fn from_iter<T: IntoIterator<Item = ForecastedYield>>(iter: T) -> Self {
        let mut set = Self::new();
        for forecast in iter {
            set.by_protocol.insert(forecast.protocol.clone(), forecast);
        }
        set
    }
}
