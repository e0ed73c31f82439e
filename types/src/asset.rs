//! Chain and asset identifiers.
//!
//! Both are 16-bit on the wire. An asset is identified by the chain that
//! issued it plus a per-chain asset number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one chain in the multi-chain platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(u16);

impl ChainId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ChainId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// An asset: the chain that owns it and its id on that chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetKey {
    pub chain_id: ChainId,
    pub asset_id: u16,
}

impl AssetKey {
    /// Encoded length in keys and on the wire.
    pub const LEN: usize = 4;

    pub const fn new(chain_id: ChainId, asset_id: u16) -> Self {
        Self { chain_id, asset_id }
    }

    /// Big-endian key encoding so that byte order matches numeric order.
    pub fn to_key_bytes(&self) -> [u8; Self::LEN] {
        let c = self.chain_id.to_be_bytes();
        let a = self.asset_id.to_be_bytes();
        [c[0], c[1], a[0], a[1]]
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.chain_id, self.asset_id)
    }
}
