//! Rebalancing optimizer.
//!
//! Each epoch the optimizer weighs the forecast-implied gain of moving to
//! a better allocation against the discrete cost of getting there. The
//! fixed-plus-thresholded cost structure creates a no-trade region around
//! the current allocation: small forecast edges are not worth realizing
//! when gas and slippage consume them, so the optimizer emits `Rebalance`
//! only when the net gain clears a configured improvement threshold.
//!
//! Degraded inputs never trade blind: missing forecasts for held sleeves
//! and risk-infeasible candidate sets both fall back to `Hold`, with the
//! condition reported on the log and the decision reason.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::cost::CostModel;
use crate::domain::{
    AllocationVector, Decision, ForecastSet, HoldReason, PortfolioState, ProtocolId, Trade, Venue,
};
use crate::error::{EngineError, Error, Result};

/// Trades smaller than this (in dollars) are dropped as dust.
const DUST_AMOUNT: Decimal = dec!(0.01);

/// Tunable surface of the optimizer. All values are validated at config
/// load time.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    /// Maximum tolerated tail loss, as a fraction of capital per year.
    pub risk_limit: Decimal,
    /// Minimum net dollar gain per epoch required to trade.
    pub min_improvement_threshold: Decimal,
    /// Net-gain window (dollars) within which candidates count as tied.
    pub tie_break_tolerance: Decimal,
    /// Quantile multiplier on forecast uncertainty for the tail proxy.
    pub tail_z: Decimal,
    /// Number of epochs per year, for scaling APY to per-epoch returns.
    pub epochs_per_year: Decimal,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            risk_limit: dec!(0.05),
            min_improvement_threshold: dec!(0.01),
            tie_break_tolerance: dec!(0.005),
            tail_z: dec!(1.65),
            epochs_per_year: dec!(365),
        }
    }
}

/// A candidate target with its planned trades and scored net gain.
#[derive(Debug, Clone)]
struct Evaluation {
    target: AllocationVector,
    trades: Vec<Trade>,
    net_gain: Decimal,
}

/// Cost-aware rebalancing decision engine.
#[derive(Debug, Clone)]
pub struct Optimizer {
    settings: OptimizerSettings,
}

impl Optimizer {
    /// Create an optimizer with the given settings.
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// The active settings.
    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Decide the next allocation for one epoch.
    ///
    /// Returns `Hold` when forecasts are incomplete for held sleeves, when
    /// no candidate satisfies the risk limit, or when the best candidate's
    /// net gain does not clear the improvement threshold. Unknown chains
    /// or protocols in the cost path are hard errors: they indicate a
    /// configuration gap, not a market condition.
    pub fn decide(
        &self,
        state: &PortfolioState,
        forecasts: &ForecastSet,
        cost_model: &CostModel,
    ) -> Result<Decision> {
        let missing = forecasts.missing_for(&state.allocation);
        if !missing.is_empty() {
            let error = EngineError::IncompleteForecast { missing };
            warn!(error = %error, epoch = state.epoch, "holding: incomplete forecasts");
            return Ok(Decision::Hold {
                reason: HoldReason::IncompleteForecast,
            });
        }
        if forecasts.is_empty() {
            warn!(epoch = state.epoch, "holding: no forecasts at all");
            return Ok(Decision::Hold {
                reason: HoldReason::IncompleteForecast,
            });
        }

        let candidates = self.candidate_targets(forecasts);
        let feasible: Vec<AllocationVector> = candidates
            .into_iter()
            .filter(|c| {
                self.tail_risk(c, forecasts)
                    .is_some_and(|risk| risk <= self.settings.risk_limit)
            })
            .collect();

        if feasible.is_empty() {
            let error = EngineError::RiskInfeasible {
                risk_limit: self.settings.risk_limit,
            };
            warn!(error = %error, epoch = state.epoch, "holding: risk constraint infeasible");
            return Ok(Decision::Hold {
                reason: HoldReason::RiskInfeasible,
            });
        }

        let current_return = self.expected_epoch_return(&state.allocation, forecasts, state);
        let mut evaluations = Vec::with_capacity(feasible.len());
        for target in feasible {
            let trades = self.plan_trades(state, &target, cost_model)?;
            if trades.is_empty() {
                // Indistinguishable from the current allocation.
                continue;
            }
            let total_cost: Decimal = trades.iter().map(|t| t.estimated_cost).sum();
            let gain = self.expected_epoch_return(&target, forecasts, state) - current_return;
            evaluations.push(Evaluation {
                target,
                trades,
                net_gain: gain - total_cost,
            });
        }

        let best_net = evaluations
            .iter()
            .map(|e| e.net_gain)
            .max()
            .unwrap_or(Decimal::ZERO);

        if best_net <= self.settings.min_improvement_threshold {
            debug!(
                epoch = state.epoch,
                best_net = %best_net,
                threshold = %self.settings.min_improvement_threshold,
                "holding: inside no-trade region"
            );
            return Ok(Decision::Hold {
                reason: HoldReason::NoNetImprovement,
            });
        }

        // Among near-tied candidates prefer the one needing the fewest
        // trades: less cost-model uncertainty and less execution risk.
        let Some(chosen) = evaluations
            .into_iter()
            .filter(|e| e.net_gain >= best_net - self.settings.tie_break_tolerance)
            .min_by_key(|e| e.trades.len())
        else {
            return Ok(Decision::Hold {
                reason: HoldReason::NoNetImprovement,
            });
        };

        debug!(
            epoch = state.epoch,
            net_gain = %chosen.net_gain,
            trades = chosen.trades.len(),
            "rebalancing"
        );
        Ok(Decision::Rebalance {
            target: chosen.target,
            trades: chosen.trades,
        })
    }

    /// Candidate target allocations for this cycle.
    ///
    /// Full concentration in each forecasted protocol, an equal-weight
    /// spread, and a blend weighted by risk-adjusted forecast edge. All
    /// candidates are clamped and renormalized before scoring.
    fn candidate_targets(&self, forecasts: &ForecastSet) -> Vec<AllocationVector> {
        let protocols = forecasts.protocols();
        let mut candidates = Vec::with_capacity(protocols.len() + 2);

        for protocol in &protocols {
            candidates.push(AllocationVector::single(protocol.clone()));
        }

        if protocols.len() > 1 {
            let count = Decimal::from(protocols.len() as u64);
            let equal: BTreeMap<ProtocolId, Decimal> = protocols
                .iter()
                .map(|p| (p.clone(), Decimal::ONE / count))
                .collect();
            candidates.push(AllocationVector::clamp_and_renormalize(equal));

            let edges: BTreeMap<ProtocolId, Decimal> = protocols
                .iter()
                .filter_map(|p| {
                    let forecast = forecasts.get(p)?;
                    let edge =
                        forecast.expected_apy - self.settings.tail_z * forecast.uncertainty;
                    (edge > Decimal::ZERO).then(|| (p.clone(), edge))
                })
                .collect();
            if !edges.is_empty() {
                candidates.push(AllocationVector::clamp_and_renormalize(edges));
            }
        }

        candidates.dedup();
        candidates
    }

    /// Expected dollar return of holding `allocation` for one epoch.
    fn expected_epoch_return(
        &self,
        allocation: &AllocationVector,
        forecasts: &ForecastSet,
        state: &PortfolioState,
    ) -> Decimal {
        allocation
            .iter()
            .filter_map(|(protocol, fraction)| {
                let forecast = forecasts.get(protocol)?;
                Some(*fraction * forecast.expected_apy)
            })
            .sum::<Decimal>()
            / self.settings.epochs_per_year
            * state.total_capital
    }

    /// CVaR-style tail-loss proxy for an allocation, as an annualized
    /// fraction of capital.
    ///
    /// Per sleeve: `tail_z * uncertainty - expected_apy`, floored at zero,
    /// combined by allocation weight. Comonotonic upper bound on the
    /// diversified quantile loss; avoids square roots in fixed-point math.
    /// `None` means a sleeve has no forecast and the allocation cannot be
    /// risk-assessed at all.
    fn tail_risk(&self, allocation: &AllocationVector, forecasts: &ForecastSet) -> Option<Decimal> {
        let mut total = Decimal::ZERO;
        for (protocol, fraction) in allocation.iter() {
            let forecast = forecasts.get(protocol)?;
            let tail_loss = (self.settings.tail_z * forecast.uncertainty
                - forecast.expected_apy)
                .max(Decimal::ZERO);
            total += *fraction * tail_loss;
        }
        Some(total)
    }

    /// Plan the deterministic minimal trade list from the current
    /// allocation to `target`.
    ///
    /// Over-weight sleeves are drained into under-weight sleeves in sorted
    /// protocol order; an idle portfolio draws from idle cash. Sub-cent
    /// movements are dropped as dust.
    fn plan_trades(
        &self,
        state: &PortfolioState,
        target: &AllocationVector,
        cost_model: &CostModel,
    ) -> Result<Vec<Trade>> {
        let capital = state.total_capital;
        let current = &state.allocation;

        let mut protocols = current.protocols();
        for protocol in target.protocols() {
            if !protocols.contains(&protocol) {
                protocols.push(protocol);
            }
        }
        protocols.sort();

        let mut sellers: Vec<(ProtocolId, Decimal)> = Vec::new();
        let mut buyers: Vec<(ProtocolId, Decimal)> = Vec::new();
        for protocol in protocols {
            let delta = (target.fraction(&protocol) - current.fraction(&protocol)) * capital;
            if delta >= DUST_AMOUNT {
                buyers.push((protocol, delta));
            } else if delta <= -DUST_AMOUNT {
                sellers.push((protocol, -delta));
            }
        }

        let mut trades = Vec::new();
        let mut seller_idx = 0;
        for (destination, mut need) in buyers {
            while need >= DUST_AMOUNT {
                let (source, amount) = match sellers.get_mut(seller_idx) {
                    Some((seller, remaining)) => {
                        let amount = need.min(*remaining);
                        *remaining -= amount;
                        let source = Venue::Protocol(seller.clone());
                        if remaining.is_zero() {
                            seller_idx += 1;
                        }
                        (source, amount)
                    }
                    // Sellers exhausted: remainder comes from idle cash.
                    None => (Venue::IdleCash, need),
                };

                let estimated_cost = cost_model
                    .estimate(&source, &destination, amount, capital)
                    .map_err(Error::Cost)?;
                trades.push(
                    Trade::try_new(source, destination.clone(), amount, estimated_cost)
                        .map_err(Error::Domain)?,
                );
                need -= amount;
            }
        }

        Ok(trades)
    }
}
