//! Protocol reference data.
//!
//! Protocols are immutable reference entries: which chain they settle on,
//! what backs the stablecoin they pay yield in, and a coarse risk tier.
//! The registry is built once at startup and never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{ChainId, ProtocolId};

/// Coarse risk classification of a lending protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Long-established blue-chip lenders (Aave, Compound, Maker).
    Established,
    /// Protocols built on an established ecosystem (Morpho markets).
    Ecosystem,
    /// Newer protocols with shorter track records.
    Emerging,
    /// Cross-chain native protocols with bridge exposure.
    CrossChain,
}

/// What backs the stablecoin a protocol pays yield in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StablecoinBacking {
    /// Fiat-reserve backed (USDC, USDT).
    Fiat,
    /// Crypto-collateralized (DAI, LUSD).
    Crypto,
    /// Algorithmic or partially-collateralized.
    Algorithmic,
}

/// Immutable reference data for one lending protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    /// Protocol identifier (e.g. "aave-v3").
    pub id: ProtocolId,
    /// Chain the protocol settles on (e.g. "ethereum", "arbitrum").
    pub chain: ChainId,
    /// Backing class of the deposited stablecoin.
    pub backing: StablecoinBacking,
    /// Coarse risk tier.
    pub tier: RiskTier,
}

impl Protocol {
    /// Create a new protocol reference entry.
    pub fn new(
        id: impl Into<ProtocolId>,
        chain: impl Into<ChainId>,
        backing: StablecoinBacking,
        tier: RiskTier,
    ) -> Self {
        Self {
            id: id.into(),
            chain: chain.into(),
            backing,
            tier,
        }
    }
}

/// Registry of known protocols, keyed by protocol ID.
///
/// Built once from configuration or reference data. Lookups that miss
/// indicate a configuration gap, not a runtime condition.
#[derive(Debug, Clone, Default)]
pub struct ProtocolRegistry {
    protocols: BTreeMap<ProtocolId, Protocol>,
}

impl ProtocolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a protocol. Later entries with the same ID replace earlier ones.
    pub fn register(&mut self, protocol: Protocol) {
        self.protocols.insert(protocol.id.clone(), protocol);
    }

    /// Look up a protocol by ID.
    pub fn get(&self, id: &ProtocolId) -> Option<&Protocol> {
        self.protocols.get(id)
    }

    /// Look up the chain a protocol settles on.
    ///
    /// Returns `DomainError::UnknownProtocol` when the registry has no entry.
    pub fn chain_of(&self, id: &ProtocolId) -> Result<&ChainId, DomainError> {
        self.protocols
            .get(id)
            .map(|p| &p.chain)
            .ok_or_else(|| DomainError::UnknownProtocol {
                protocol: id.clone(),
            })
    }

    /// All registered protocol IDs in sorted order.
    pub fn ids(&self) -> Vec<ProtocolId> {
        self.protocols.keys().cloned().collect()
    }

    /// Iterate over registered protocols in sorted ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Protocol> {
        self.protocols.values()
    }

    /// Number of registered protocols.
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl FromIterator<Protocol> for ProtocolRegistry {
    fn from_iter<T: IntoIterator<Item = Protocol>>(iter: T) -> Self {
        let mut registry = Self::new();
        for protocol in iter {
            registry.register(protocol);
        }
        registry
    }
}
