//! External data provider ports.
//!
//! The engine consumes observed yields and forecasts through these traits
//! and does not care how they are produced - a periodic collector hitting
//! a public yields API, a statistical model, or the in-memory fixtures
//! below. Queries are synchronous, once per epoch per portfolio; a
//! timeout surfaces as [`ProviderError::Timeout`] and degrades the epoch
//! to a hold rather than blocking it.

use std::collections::BTreeMap;

use crate::domain::{ForecastSet, ForecastedYield, ObservationPanel, ProtocolId, YieldObservation};
use crate::error::ProviderError;

/// Read-only source of per-protocol yield observations.
pub trait SnapshotStore: Send + Sync {
    /// Observations for the given protocols at one epoch.
    ///
    /// Protocols without an observation are simply absent from the result;
    /// staleness filtering happens in the engine.
    fn observations(
        &self,
        protocols: &[ProtocolId],
        epoch: u64,
    ) -> Result<Vec<YieldObservation>, ProviderError>;
}

/// Read-only source of forecasted yields.
pub trait ForecastProvider: Send + Sync {
    /// Forecasts for the given protocols at one epoch over a horizon.
    fn forecasts(
        &self,
        protocols: &[ProtocolId],
        epoch: u64,
        horizon: u32,
    ) -> Result<ForecastSet, ProviderError>;
}

/// In-memory snapshot store backed by an [`ObservationPanel`].
///
/// The production deployment fronts a collection process; this store
/// serves backtests and tests from a pre-built panel.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    panel: ObservationPanel,
}

impl InMemorySnapshotStore {
    /// Create a store over an existing panel.
    pub fn new(panel: ObservationPanel) -> Self {
        Self { panel }
    }

    /// Append an observation to the backing panel.
    pub fn push(&mut self, observation: YieldObservation) {
        self.panel.push(observation);
    }

    /// The backing panel.
    pub fn panel(&self) -> &ObservationPanel {
        &self.panel
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn observations(
        &self,
        protocols: &[ProtocolId],
        epoch: u64,
    ) -> Result<Vec<YieldObservation>, ProviderError> {
        Ok(self.panel.epoch_slice(protocols, epoch))
    }
}

/// In-memory forecast provider keyed by epoch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryForecastProvider {
    by_epoch: BTreeMap<u64, Vec<ForecastedYield>>,
}

impl InMemoryForecastProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a forecast for its epoch.
    pub fn push(&mut self, forecast: ForecastedYield) {
        self.by_epoch.entry(forecast.epoch).or_default().push(forecast);
    }
}

impl ForecastProvider for InMemoryForecastProvider {
    fn forecasts(
        &self,
        protocols: &[ProtocolId],
        epoch: u64,
        horizon: u32,
    ) -> Result<ForecastSet, ProviderError> {
        let set = self
            .by_epoch
            .get(&epoch)
            .into_iter()
            .flatten()
            .filter(|f| f.horizon == horizon && protocols.contains(&f.protocol))
            .cloned()
            .collect();
        Ok(set)
    }
}
