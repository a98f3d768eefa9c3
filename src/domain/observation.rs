//! Observed yield data.
//!
//! One [`YieldObservation`] per protocol per epoch, append-only. The
//! [`ObservationPanel`] stitches per-epoch snapshots into ordered
//! per-protocol series, the shape forecasting models consume.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProtocolId;

/// A single observed yield data point for one protocol at one epoch.
///
/// Never mutated after creation. APY fields are fractions (0.03 = 3%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldObservation {
    /// Protocol this observation belongs to.
    pub protocol: ProtocolId,
    /// Epoch the observation was taken in.
    pub epoch: u64,
    /// Wall-clock collection time, used for freshness checks.
    pub observed_at: DateTime<Utc>,
    /// Base lending APY.
    pub base_apy: Decimal,
    /// Incentive/reward APY on top of base.
    pub reward_apy: Decimal,
    /// Total value locked in dollars.
    pub tvl: Decimal,
    /// Trailing volatility of the total APY.
    pub trailing_volatility: Decimal,
}

impl YieldObservation {
    /// Total APY: base plus rewards.
    #[must_use]
    pub fn total_apy(&self) -> Decimal {
        self.base_apy + self.reward_apy
    }

    /// Whether this observation is older than the freshness window.
    ///
    /// Stale observations are treated as absent by the engine.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, freshness_window: Duration) -> bool {
        now - self.observed_at > freshness_window
    }
}

/// Append-only panel of observations, one series per protocol.
///
/// Series are kept in epoch order. Gaps (missed collection runs) are
/// visible via [`ObservationPanel::gaps`].
#[derive(Debug, Clone, Default)]
pub struct ObservationPanel {
    series: BTreeMap<ProtocolId, Vec<YieldObservation>>,
}

impl ObservationPanel {
    /// Create a new empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation to its protocol's series.
    ///
    /// Observations arriving out of epoch order are inserted at the
    /// correct position; duplicates for the same epoch are ignored
    /// (first write wins - observations are append-only).
    pub fn push(&mut self, observation: YieldObservation) {
        let series = self.series.entry(observation.protocol.clone()).or_default();
        match series.binary_search_by_key(&observation.epoch, |o| o.epoch) {
            Ok(_) => {}
            Err(pos) => series.insert(pos, observation),
        }
    }

    /// Full series for one protocol, in epoch order.
    pub fn series(&self, protocol: &ProtocolId) -> &[YieldObservation] {
        self.series.get(protocol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The observation for one protocol at one epoch, if collected.
    pub fn at(&self, protocol: &ProtocolId, epoch: u64) -> Option<&YieldObservation> {
        let series = self.series.get(protocol)?;
        series
            .binary_search_by_key(&epoch, |o| o.epoch)
            .ok()
            .map(|i| &series[i])
    }

    /// All observations for one epoch, across the given protocols.
    pub fn epoch_slice(&self, protocols: &[ProtocolId], epoch: u64) -> Vec<YieldObservation> {
        protocols
            .iter()
            .filter_map(|p| self.at(p, epoch).cloned())
            .collect()
    }

    /// Epochs missing from a protocol's series within its observed span.
    pub fn gaps(&self, protocol: &ProtocolId) -> Vec<u64> {
        let series = self.series(protocol);
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Vec::new();
        };
        let observed: Vec<u64> = series.iter().map(|o| o.epoch).collect();
        (first.epoch..=last.epoch)
            .filter(|e| !observed.contains(e))
            .collect()
    }

    /// Number of protocols with at least one observation.
    pub fn protocol_count(&self) -> usize {
        self.series.len()
    }

    /// Total number of observations across all series.
    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Check if the panel is empty.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn obs(protocol: &str, epoch: u64, apy: Decimal) -> YieldObservation {
        YieldObservation {
            protocol: ProtocolId::from(protocol),
            epoch,
            observed_at: Utc::now(),
            base_apy: apy,
            reward_apy: dec!(0.005),
            tvl: dec!(1_000_000),
            trailing_volatility: dec!(0.01),
        }
    }

    #[test]
    fn total_apy_sums_base_and_rewards() {
        let o = obs("aave-v3", 0, dec!(0.03));
        assert_eq!(o.total_apy(), dec!(0.035));
    }

    #[test]
    fn staleness_respects_window() {
        let now = Utc::now();
        let mut o = obs("aave-v3", 0, dec!(0.03));
        o.observed_at = now - Duration::hours(30);
        assert!(o.is_stale(now, Duration::hours(24)));
        assert!(!o.is_stale(now, Duration::hours(48)));
    }

    #[test]
    fn panel_keeps_epoch_order() {
        let mut panel = ObservationPanel::new();
        panel.push(obs("aave-v3", 2, dec!(0.03)));
        panel.push(obs("aave-v3", 0, dec!(0.02)));
        panel.push(obs("aave-v3", 1, dec!(0.025)));

        let epochs: Vec<u64> = panel
            .series(&ProtocolId::from("aave-v3"))
            .iter()
            .map(|o| o.epoch)
            .collect();
        assert_eq!(epochs, vec![0, 1, 2]);
    }

    #[test]
    fn panel_first_write_wins() {
        let mut panel = ObservationPanel::new();
        panel.push(obs("aave-v3", 0, dec!(0.02)));
        panel.push(obs("aave-v3", 0, dec!(0.99)));

        let series = panel.series(&ProtocolId::from("aave-v3"));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].base_apy, dec!(0.02));
    }

    #[test]
    fn panel_reports_gaps() {
        let mut panel = ObservationPanel::new();
        panel.push(obs("aave-v3", 0, dec!(0.02)));
        panel.push(obs("aave-v3", 3, dec!(0.03)));
        assert_eq!(panel.gaps(&ProtocolId::from("aave-v3")), vec![1, 2]);
        assert!(panel.gaps(&ProtocolId::from("missing")).is_empty());
    }
}
