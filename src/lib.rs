//! Yieldpilot - cost-aware multi-protocol rebalancing engine.
//!
//! This crate decides, given noisy yield forecasts and discrete per-action
//! transaction costs, when and how to move stablecoin capital across
//! lending protocols. The core problem is that costs are non-convex -
//! near-fixed gas per chain plus slippage that steepens past a liquidity
//! threshold - so naive "always rebalance to the forecast optimum" loses
//! money on small portfolios. The optimizer models a discrete no-trade
//! region instead.
//!
//! # Architecture
//!
//! Each epoch, per portfolio: snapshot store and forecast provider feed
//! the optimizer; the optimizer prices candidate reallocations through
//! the cost model; the tracker applies the resulting decision atomically
//! and settles accrued yield; one immutable audit record is appended.
//!
//! - [`domain`] - identifiers, protocol reference data, observations,
//!   forecasts, allocation vectors, trades, portfolio state, decisions
//! - [`cost`] - per-chain tagged fee rules and the cost model
//! - [`optimizer`] - candidate generation, tail-risk filter, no-trade
//!   region decision logic
//! - [`tracker`] - all-or-nothing state transitions and yield accrual
//! - [`provider`] - snapshot store / forecast provider ports
//! - [`engine`] - per-epoch orchestration, parallel across portfolios
//! - [`audit`] - append-only per-epoch records (memory and JSONL sinks)
//! - [`config`] - TOML configuration with load-time validation
//! - [`error`] - error types for the crate
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use yieldpilot::domain::PortfolioState;
//! use yieldpilot::optimizer::{Optimizer, OptimizerSettings};
//!
//! let optimizer = Optimizer::new(OptimizerSettings::default());
//! assert_eq!(optimizer.settings().epochs_per_year, dec!(365));
//!
//! let portfolio = PortfolioState::new(dec!(50_000)).unwrap();
//! assert!(portfolio.allocation.is_idle());
//! ```

pub mod audit;
pub mod config;
pub mod cost;
pub mod domain;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod provider;
pub mod tracker;

pub use error::{Error, Result};
