//! Account addresses.
//!
//! An address is the id of the chain it belongs to plus a 20-byte hash.
//! The fixed 22-byte encoding keeps composite store keys prefix-scannable.

use crate::asset::ChainId;
use crate::error::ParseError;
use crate::hash::hex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An account address, bound to the chain that issued it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    chain_id: ChainId,
    hash: [u8; 20],
}

impl Address {
    /// Encoded length: 2-byte chain id + 20-byte hash.
    pub const LEN: usize = 22;

    pub fn new(chain_id: ChainId, hash: [u8; 20]) -> Self {
        Self { chain_id, hash }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..2].copy_from_slice(&self.chain_id.to_be_bytes());
        out[2..].copy_from_slice(&self.hash);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() != Self::LEN {
            return Err(ParseError::Length {
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        let chain_id = ChainId::new(u16::from_be_bytes([bytes[0], bytes[1]]));
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes[2..]);
        Ok(Self { chain_id, hash })
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}:{}\u{2026})", self.chain_id, hex::encode(&self.hash[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, hex::encode(&self.hash))
    }
}

impl FromStr for Address {
    type Err = ParseError;

    /// Parse the `<chainId>:<40 hex chars>` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chain, hash) = s
            .split_once(':')
            .ok_or_else(|| ParseError::Address(s.to_string()))?;
        let chain_id: u16 = chain
            .parse()
            .map_err(|_| ParseError::Address(s.to_string()))?;
        Ok(Self::new(ChainId::new(chain_id), hex::decode_array(hash)?))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.to_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(D::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::from_bytes(&bytes).map_err(D::Error::custom)
        }
    }
}
