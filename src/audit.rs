//! Per-epoch audit records.
//!
//! Each epoch's decision and resulting state transition is emitted as one
//! immutable record for later reconciliation and backtesting. Sinks are
//! append-only: an in-memory log for simulations and tests, and a JSONL
//! file log for anything that outlives the process.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Decision, PortfolioState, Trade};
use crate::error::Result;

/// One trade as recorded on an audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Source venue label ("idle-cash" or a protocol ID).
    pub source: String,
    /// Destination protocol ID.
    pub destination: String,
    /// Dollar amount moved.
    pub amount: Decimal,
    /// Estimated cost at decision time.
    pub estimated_cost: Decimal,
}

impl From<&Trade> for TradeRecord {
    fn from(trade: &Trade) -> Self {
        Self {
            source: trade.source.to_string(),
            destination: trade.destination.to_string(),
            amount: trade.amount,
            estimated_cost: trade.estimated_cost,
        }
    }
}

/// Immutable record of one epoch's decision and state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Portfolio label (cohort or account identifier).
    pub portfolio: String,
    /// Epoch the decision was made for.
    pub epoch: u64,
    /// Decision kind: "hold" or "rebalance".
    pub decision: String,
    /// Hold reason code, when the decision was a hold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Trades in application order (empty for holds).
    pub trades: Vec<TradeRecord>,
    /// Cost realized this epoch.
    pub realized_cost: Decimal,
    /// Total capital after the transition.
    pub total_capital: Decimal,
    /// Allocation after the transition, protocol to fraction.
    pub allocation: BTreeMap<String, Decimal>,
    /// Anomaly note (e.g. a rejected overdrawing trade list).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<String>,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record from a decision and the state it produced.
    pub fn from_transition(
        portfolio: impl Into<String>,
        decided_at_epoch: u64,
        decision: &Decision,
        realized_cost: Decimal,
        resulting: &PortfolioState,
        anomaly: Option<String>,
    ) -> Self {
        Self {
            portfolio: portfolio.into(),
            epoch: decided_at_epoch,
            decision: decision.kind().to_string(),
            reason: decision.hold_reason().map(|r| r.as_str().to_string()),
            trades: decision.trades().iter().map(TradeRecord::from).collect(),
            realized_cost,
            total_capital: resulting.total_capital,
            allocation: resulting
                .allocation
                .iter()
                .map(|(p, f)| (p.to_string(), *f))
                .collect(),
            anomaly,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only audit sink.
pub trait AuditLog: Send + Sync {
    /// Append one record. Records are never updated or removed.
    fn append(&self, record: AuditRecord) -> Result<()>;
}

/// In-memory audit log for simulations and tests.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records appended so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, record: AuditRecord) -> Result<()> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// JSONL file audit log, one serialized record per line.
#[derive(Debug)]
pub struct JsonlAuditLog {
    file: Mutex<File>,
}

impl JsonlAuditLog {
    /// Open (or create) a JSONL log at `path`, appending to existing content.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditLog for JsonlAuditLog {
    fn append(&self, record: AuditRecord) -> Result<()> {
        let line = serde_json::to_string(&record)?;
        let mut file = self.file.lock();
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AllocationVector, HoldReason, ProtocolId};
    use rust_decimal_macros::dec;

    fn record(epoch: u64) -> AuditRecord {
        let state = PortfolioState::with_allocation(
            dec!(10_000),
            AllocationVector::single(ProtocolId::from("aave-v3")),
        )
        .unwrap();
        AuditRecord::from_transition(
            "cohort-1",
            epoch,
            &Decision::Hold {
                reason: HoldReason::NoNetImprovement,
            },
            Decimal::ZERO,
            &state,
            None,
        )
    }

    #[test]
    fn memory_log_appends_in_order() {
        let log = MemoryAuditLog::new();
        log.append(record(0)).unwrap();
        log.append(record(1)).unwrap();

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].epoch, 0);
        assert_eq!(records[1].epoch, 1);
    }

    #[test]
    fn record_captures_hold_reason() {
        let r = record(3);
        assert_eq!(r.decision, "hold");
        assert_eq!(r.reason.as_deref(), Some("no_net_improvement"));
        assert!(r.trades.is_empty());
    }

    #[test]
    fn record_round_trips_through_json() {
        let r = record(7);
        let line = serde_json::to_string(&r).unwrap();
        let parsed: AuditRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.epoch, 7);
        assert_eq!(parsed.portfolio, "cohort-1");
        assert_eq!(parsed.allocation.get("aave-v3"), Some(&dec!(1)));
    }
}
