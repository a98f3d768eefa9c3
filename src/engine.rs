//! Epoch orchestration.
//!
//! One decision cycle per epoch per portfolio: query the snapshot store
//! and forecast provider, drop stale observations, run the optimizer,
//! apply the decision through the tracker, settle accrued yield, and emit
//! an audit record. Provider failures and overdrawing trade lists degrade
//! the epoch to a hold; they never abort the run.
//!
//! Epochs within one portfolio are strictly sequential. Parallelism is
//! across independent portfolios only - each owns its state, and the only
//! shared object is the lock-protected audit sink.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{info, info_span, warn};

use crate::audit::{AuditLog, AuditRecord};
use crate::cost::CostModel;
use crate::domain::{Decision, HoldReason, PortfolioState, ProtocolId, YieldObservation};
use crate::error::{EngineError, Error, Result};
use crate::optimizer::Optimizer;
use crate::provider::{ForecastProvider, SnapshotStore};
use crate::tracker::Tracker;

/// A labeled portfolio: cohort identifier plus its state.
pub type LabeledPortfolio = (String, PortfolioState);

/// Drives the per-epoch decision cycle for one or more portfolios.
pub struct EpochEngine<S, F> {
    optimizer: Optimizer,
    tracker: Tracker,
    cost_model: CostModel,
    store: S,
    forecast_provider: F,
    audit: Arc<dyn AuditLog>,
    freshness_window: Duration,
    horizon: u32,
}

impl<S: SnapshotStore, F: ForecastProvider> EpochEngine<S, F> {
    /// Assemble an engine from its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        optimizer: Optimizer,
        tracker: Tracker,
        cost_model: CostModel,
        store: S,
        forecast_provider: F,
        audit: Arc<dyn AuditLog>,
        freshness_window: Duration,
        horizon: u32,
    ) -> Self {
        Self {
            optimizer,
            tracker,
            cost_model,
            store,
            forecast_provider,
            audit,
            freshness_window,
            horizon,
        }
    }

    /// Run one epoch for one portfolio, mutating its state in place.
    ///
    /// Returns the audit record that was appended. Only configuration
    /// gaps (unknown chain/protocol in the cost path) and audit-sink IO
    /// surface as errors.
    pub fn run_epoch(&self, label: &str, state: &mut PortfolioState) -> Result<AuditRecord> {
        let span = info_span!("epoch", portfolio = label, epoch = state.epoch);
        let _guard = span.enter();

        let protocols = self.cost_model.registry().ids();

        let observations = match self.store.observations(&protocols, state.epoch) {
            Ok(observations) => observations,
            Err(error) => {
                warn!(%error, "snapshot store unavailable, holding");
                return self.hold_epoch(label, state, HoldReason::DataUnavailable, None, &[]);
            }
        };
        let fresh = self.fresh_only(observations);

        // A held sleeve without a fresh observation means we cannot even
        // see what we own; stale data is treated as absent.
        let unobserved = self.unobserved_holdings(state, &fresh);
        if !unobserved.is_empty() {
            warn!(?unobserved, "held sleeves lack fresh observations, holding");
            return self.hold_epoch(label, state, HoldReason::IncompleteForecast, None, &fresh);
        }

        let forecasts = match self
            .forecast_provider
            .forecasts(&protocols, state.epoch, self.horizon)
        {
            Ok(forecasts) => forecasts,
            Err(error) => {
                warn!(%error, "forecast provider unavailable, holding");
                return self.hold_epoch(label, state, HoldReason::DataUnavailable, None, &fresh);
            }
        };

        let decision = self.optimizer.decide(state, &forecasts, &self.cost_model)?;

        match self.tracker.apply(&decision, state) {
            Ok(mut next) => {
                self.tracker.accrue(&mut next, &fresh);
                let realized_cost =
                    next.cumulative_realized_cost - state.cumulative_realized_cost;
                let record = AuditRecord::from_transition(
                    label,
                    state.epoch,
                    &decision,
                    realized_cost,
                    &next,
                    None,
                );
                self.audit.append(record.clone())?;
                info!(decision = decision.kind(), realized_cost = %realized_cost, "epoch settled");
                *state = next;
                Ok(record)
            }
            Err(error @ EngineError::InsufficientCapital { .. }) => {
                // The whole trade list is rejected; the epoch holds and
                // the anomaly goes on the record for investigation.
                warn!(%error, "rebalance rejected, holding");
                self.hold_epoch(
                    label,
                    state,
                    HoldReason::InsufficientCapital,
                    Some(error.to_string()),
                    &fresh,
                )
            }
            Err(error) => Err(Error::Engine(error)),
        }
    }

    /// Run `epochs` sequential epochs for each portfolio, portfolios in
    /// parallel. No state is shared across portfolios.
    pub fn run_portfolios(
        &self,
        portfolios: &mut [LabeledPortfolio],
        epochs: u64,
    ) -> Result<()> {
        portfolios.par_iter_mut().try_for_each(|(label, state)| {
            for _ in 0..epochs {
                self.run_epoch(label, state)?;
            }
            Ok(())
        })
    }

    fn fresh_only(&self, observations: Vec<YieldObservation>) -> Vec<YieldObservation> {
        let now = Utc::now();
        observations
            .into_iter()
            .filter(|o| !o.is_stale(now, self.freshness_window))
            .collect()
    }

    fn unobserved_holdings(
        &self,
        state: &PortfolioState,
        fresh: &[YieldObservation],
    ) -> Vec<ProtocolId> {
        state
            .allocation
            .iter()
            .filter(|(protocol, fraction)| {
                **fraction > Decimal::ZERO && !fresh.iter().any(|o| &o.protocol == *protocol)
            })
            .map(|(protocol, _)| protocol.clone())
            .collect()
    }

    fn hold_epoch(
        &self,
        label: &str,
        state: &mut PortfolioState,
        reason: HoldReason,
        anomaly: Option<String>,
        fresh: &[YieldObservation],
    ) -> Result<AuditRecord> {
        let decision = Decision::Hold { reason };
        let mut next = self.tracker.apply(&decision, state).map_err(Error::Engine)?;
        self.tracker.accrue(&mut next, fresh);
        let record = AuditRecord::from_transition(
            label,
            state.epoch,
            &decision,
            Decimal::ZERO,
            &next,
            anomaly,
        );
        self.audit.append(record.clone())?;
        *state = next;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::cost::{FeeRule, FeeTable};
    use crate::domain::{
        ChainId, ForecastSet, ForecastedYield, Protocol, ProtocolRegistry, RiskTier,
        StablecoinBacking,
    };
    use crate::optimizer::OptimizerSettings;
    use crate::provider::{InMemoryForecastProvider, InMemorySnapshotStore};
    use rust_decimal_macros::dec;

    struct FailingStore;
    impl SnapshotStore for FailingStore {
        fn observations(
            &self,
            _protocols: &[ProtocolId],
            _epoch: u64,
        ) -> std::result::Result<Vec<YieldObservation>, crate::error::ProviderError> {
            Err(crate::error::ProviderError::Timeout("store".into()))
        }
    }

    struct EmptyForecasts;
    impl ForecastProvider for EmptyForecasts {
        fn forecasts(
            &self,
            _protocols: &[ProtocolId],
            _epoch: u64,
            _horizon: u32,
        ) -> std::result::Result<ForecastSet, crate::error::ProviderError> {
            Ok(ForecastSet::new())
        }
    }

    fn cost_model() -> CostModel {
        let registry: ProtocolRegistry = [Protocol::new(
            "proto-a",
            "chain-a",
            StablecoinBacking::Fiat,
            RiskTier::Established,
        )]
        .into_iter()
        .collect();
        let fees = FeeTable::try_new(
            [(ChainId::from("chain-a"), FeeRule::Flat { fixed_gas: dec!(2) })]
                .into_iter()
                .collect(),
        )
        .unwrap();
        CostModel::new(fees, registry)
    }

    #[test]
    fn store_timeout_degrades_to_hold() {
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = EpochEngine::new(
            Optimizer::new(OptimizerSettings::default()),
            Tracker::new(dec!(365)),
            cost_model(),
            FailingStore,
            EmptyForecasts,
            audit.clone(),
            Duration::hours(24),
            1,
        );

        let mut state = PortfolioState::new(dec!(10_000)).unwrap();
        let record = engine.run_epoch("cohort-1", &mut state).unwrap();

        assert_eq!(record.decision, "hold");
        assert_eq!(record.reason.as_deref(), Some("data_unavailable"));
        assert_eq!(state.epoch, 1);
        assert_eq!(audit.len(), 1);
    }

    #[test]
    fn stale_observations_hold_with_incomplete_data() {
        let mut store = InMemorySnapshotStore::default();
        store.push(YieldObservation {
            protocol: ProtocolId::from("proto-a"),
            epoch: 0,
            observed_at: Utc::now() - Duration::hours(72),
            base_apy: dec!(0.03),
            reward_apy: Decimal::ZERO,
            tvl: dec!(1_000_000),
            trailing_volatility: dec!(0.01),
        });
        let mut provider = InMemoryForecastProvider::new();
        provider.push(ForecastedYield {
            protocol: ProtocolId::from("proto-a"),
            epoch: 0,
            horizon: 1,
            expected_apy: dec!(0.03),
            uncertainty: dec!(0.002),
        });

        let audit = Arc::new(MemoryAuditLog::new());
        let engine = EpochEngine::new(
            Optimizer::new(OptimizerSettings::default()),
            Tracker::new(dec!(365)),
            cost_model(),
            store,
            provider,
            audit.clone(),
            Duration::hours(24),
            1,
        );

        let mut state = PortfolioState::with_allocation(
            dec!(10_000),
            crate::domain::AllocationVector::single(ProtocolId::from("proto-a")),
        )
        .unwrap();
        let record = engine.run_epoch("cohort-1", &mut state).unwrap();

        assert_eq!(record.reason.as_deref(), Some("incomplete_forecast"));
        // Stale sleeve earns nothing.
        assert_eq!(state.total_capital, dec!(10_000));
    }
}
