//! Core domain types for the rebalancing engine.
//!
//! Everything here is provider-agnostic: identifiers, protocol reference
//! data, observed and forecasted yields, allocation vectors, trades,
//! portfolio state, and decisions.

pub mod allocation;
pub mod decision;
pub mod error;
pub mod forecast;
pub mod id;
pub mod observation;
pub mod portfolio;
pub mod protocol;
pub mod trade;

pub use allocation::{AllocationVector, FRACTION_TOLERANCE};
pub use decision::{Decision, HoldReason};
pub use error::DomainError;
pub use forecast::{ForecastSet, ForecastedYield};
pub use id::{ChainId, ProtocolId};
pub use observation::{ObservationPanel, YieldObservation};
pub use portfolio::PortfolioState;
pub use protocol::{Protocol, ProtocolRegistry, RiskTier, StablecoinBacking};
pub use trade::{Trade, Venue};
