//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lending protocol identifier - newtype for type safety.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProtocolId(String);

impl ProtocolId {
    /// Create a new `ProtocolId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the protocol ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProtocolId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ProtocolId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Blockchain network identifier - newtype for type safety.
///
/// Keys the fee table: every chain a protocol settles on must have a
/// configured fee rule before trades into it can be costed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(String);

impl ChainId {
    /// Create a new `ChainId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the chain ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_id_display_and_as_str() {
        let id = ProtocolId::new("aave-v3");
        assert_eq!(id.as_str(), "aave-v3");
        assert_eq!(id.to_string(), "aave-v3");
    }

    #[test]
    fn chain_id_from_str() {
        let chain = ChainId::from("arbitrum");
        assert_eq!(chain, ChainId::new("arbitrum"));
    }

    #[test]
    fn ids_order_deterministically() {
        let mut ids = vec![ProtocolId::from("morpho-blue"), ProtocolId::from("aave-v3")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "aave-v3");
    }
}
