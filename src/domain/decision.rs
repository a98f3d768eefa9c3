//! Rebalancing decisions.
//!
//! The optimizer emits exactly one [`Decision`] per epoch: either a
//! [`Decision::Rebalance`] with a target allocation and the trades that
//! reach it, or a [`Decision::Hold`] carrying the reason. Degraded paths
//! (missing data, infeasible risk) are ordinary `Hold` outcomes, not
//! errors - hard failures are reserved for configuration problems.

use serde::{Deserialize, Serialize};

use super::allocation::AllocationVector;
use super::trade::Trade;

/// Why an epoch held instead of trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldReason {
    /// Best candidate's net gain did not clear the improvement threshold.
    NoNetImprovement,
    /// A held protocol was missing a forecast or fresh observation.
    IncompleteForecast,
    /// No candidate allocation satisfied the tail-risk limit.
    RiskInfeasible,
    /// A data provider timed out or was unavailable this epoch.
    DataUnavailable,
    /// The proposed trade list would have overdrawn total capital.
    InsufficientCapital,
}

impl HoldReason {
    /// Stable string form used on audit records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HoldReason::NoNetImprovement => "no_net_improvement",
            HoldReason::IncompleteForecast => "incomplete_forecast",
            HoldReason::RiskInfeasible => "risk_infeasible",
            HoldReason::DataUnavailable => "data_unavailable",
            HoldReason::InsufficientCapital => "insufficient_capital",
        }
    }
}

/// Outcome of one epoch's rebalancing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// Keep the current allocation.
    Hold {
        /// Why the epoch holds.
        reason: HoldReason,
    },
    /// Move to a new target allocation via the listed trades.
    Rebalance {
        /// Target allocation after all trades apply.
        target: AllocationVector,
        /// Trades in application order. Never reordered downstream.
        trades: Vec<Trade>,
    },
}

impl Decision {
    /// Returns true for a hold decision.
    #[must_use]
    pub const fn is_hold(&self) -> bool {
        matches!(self, Self::Hold { .. })
    }

    /// Returns true for a rebalance decision.
    #[must_use]
    pub const fn is_rebalance(&self) -> bool {
        matches!(self, Self::Rebalance { .. })
    }

    /// The hold reason, if this is a hold.
    #[must_use]
    pub fn hold_reason(&self) -> Option<HoldReason> {
        match self {
            Self::Hold { reason } => Some(*reason),
            Self::Rebalance { .. } => None,
        }
    }

    /// The trade list, or an empty slice for holds.
    #[must_use]
    pub fn trades(&self) -> &[Trade] {
        match self {
            Self::Hold { .. } => &[],
            Self::Rebalance { trades, .. } => trades,
        }
    }

    /// Stable decision-kind label used on audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Hold { .. } => "hold",
            Self::Rebalance { .. } => "rebalance",
        }
    }
}
