//! 8-byte nonces linking balance entries into per-account chains.

use crate::error::ParseError;
use crate::hash::hex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A nonce: the link value between consecutive balance entries.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Nonce([u8; 8]);

impl Nonce {
    /// Sentinel for "no entry yet": the `fromNonce` of a chain's first entry
    /// and the `nextNonce` of its tip.
    pub const GENESIS: Self = Self([0u8; 8]);

    pub const LEN: usize = 8;

    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub fn is_genesis(&self) -> bool {
        self.0 == [0u8; 8]
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", hex::encode(&self.0))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for Nonce {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(hex::decode_array(s)?))
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::serialize_bytes(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        hex::deserialize_array(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_default() {
        assert_eq!(Nonce::default(), Nonce::GENESIS);
        assert!(Nonce::GENESIS.is_genesis());
        assert!(!Nonce::new([0, 0, 0, 0, 0, 0, 0, 1]).is_genesis());
    }

    #[test]
    fn bincode_roundtrip() {
        let nonce = Nonce::new([1, 2, 3, 4, 5, 6, 7, 8]);
        let bytes = bincode::serialize(&nonce).unwrap();
        let back: Nonce = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, nonce);
    }
}
