//! Portfolio state tracker.
//!
//! The tracker owns every mutation of [`PortfolioState`]. `apply` advances
//! the state by one decision - all-or-nothing for rebalances - and
//! `accrue` settles one epoch of realized yield from observations. Epochs
//! are strictly sequential: state at epoch N is a required input to the
//! decision at N+1.

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{Decision, PortfolioState, YieldObservation};
use crate::error::EngineError;

/// Applies decisions and yield accrual to portfolio state.
#[derive(Debug, Clone)]
pub struct Tracker {
    epochs_per_year: Decimal,
}

impl Tracker {
    /// Create a tracker scaling annual yields over `epochs_per_year`.
    pub fn new(epochs_per_year: Decimal) -> Self {
        Self { epochs_per_year }
    }

    /// Apply a decision to the prior state, producing the next state.
    ///
    /// `Hold` increments the epoch counter and changes nothing else.
    /// `Rebalance` applies the trade list in the order given, deducting
    /// each trade's estimated cost; if the running cost would overdraw
    /// total capital the whole decision is rejected with
    /// `InsufficientCapital` and no trade is applied.
    pub fn apply(
        &self,
        decision: &Decision,
        prior: &PortfolioState,
    ) -> Result<PortfolioState, EngineError> {
        match decision {
            Decision::Hold { .. } => {
                let mut next = prior.clone();
                next.epoch += 1;
                Ok(next)
            }
            Decision::Rebalance { target, trades } => {
                let mut remaining = prior.total_capital;
                for trade in trades {
                    if trade.estimated_cost > remaining {
                        let total: Decimal = trades.iter().map(|t| t.estimated_cost).sum();
                        return Err(EngineError::InsufficientCapital {
                            required: total,
                            available: prior.total_capital,
                        });
                    }
                    remaining -= trade.estimated_cost;
                }

                let realized_cost = prior.total_capital - remaining;
                debug!(
                    epoch = prior.epoch,
                    trades = trades.len(),
                    realized_cost = %realized_cost,
                    "applying rebalance"
                );

                Ok(PortfolioState {
                    epoch: prior.epoch + 1,
                    allocation: target.clone(),
                    total_capital: remaining,
                    cumulative_realized_cost: prior.cumulative_realized_cost + realized_cost,
                    cumulative_net_return: prior.cumulative_net_return - realized_cost,
                })
            }
        }
    }

    /// Settle one epoch of realized yield into the state.
    ///
    /// Each held sleeve earns `capital * fraction * total_apy /
    /// epochs_per_year` from its observation. Sleeves without an
    /// observation earn nothing this epoch.
    pub fn accrue(&self, state: &mut PortfolioState, observations: &[YieldObservation]) {
        let mut earned = Decimal::ZERO;
        for (protocol, fraction) in state.allocation.iter() {
            let Some(observation) = observations.iter().find(|o| &o.protocol == protocol) else {
                debug!(%protocol, epoch = state.epoch, "no observation, sleeve earns nothing");
                continue;
            };
            earned +=
                state.total_capital * *fraction * observation.total_apy() / self.epochs_per_year;
        }

        if !earned.is_zero() {
            state.total_capital += earned;
            state.cumulative_net_return += earned;
        }
    }
}
