//! Transaction hashes and the node identifiers derived from them.

use crate::error::ParseError;
use crate::nonce::Nonce;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 32-byte transaction hash (Blake2b-256 of the unsigned transaction bytes).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash arbitrary bytes with Blake2b-256.
    pub fn digest(data: &[u8]) -> Self {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(data);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The nonce a transaction with this hash produces: its last 8 bytes.
    pub fn nonce(&self) -> Nonce {
        let mut n = [0u8; 8];
        n.copy_from_slice(&self.0[24..]);
        Nonce::new(n)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for TxHash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(hex::decode_array(s)?))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::serialize_bytes(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        hex::deserialize_array(deserializer).map(Self)
    }
}

/// Identifier of a consensus node (agent): the hash of its registration transaction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(TxHash);

impl NodeId {
    pub fn from_registration(tx_hash: TxHash) -> Self {
        Self(tx_hash)
    }

    pub fn tx_hash(&self) -> &TxHash {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", hex::encode(&self.0.as_bytes()[..4]))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for NodeId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TxHash::from_str(s).map(Self)
    }
}

// Inline hex helpers to avoid adding the `hex` crate as a dependency of types.
pub(crate) mod hex {
    use crate::error::ParseError;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, ParseError> {
        if s.len() % 2 != 0 {
            return Err(ParseError::Hex(format!("odd length {}", s.len())));
        }
        (0..s.len())
            .step_by(2)
            .map(|i| {
                s.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| ParseError::Hex(s.to_string()))
            })
            .collect()
    }

    pub fn decode_array<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
        let bytes = decode(s)?;
        bytes.try_into().map_err(|v: Vec<u8>| ParseError::Length {
            expected: N,
            actual: v.len(),
        })
    }

    /// Hex string for human-readable formats (JSON, TOML), raw bytes otherwise.
    pub fn serialize_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize_array<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            decode_array(&s).map_err(D::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            let len = bytes.len();
            bytes.try_into().map_err(|_| {
                D::Error::custom(ParseError::Length {
                    expected: N,
                    actual: len,
                })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_hash_suffix() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let hash = TxHash::new(bytes);
        assert_eq!(hash.nonce().as_bytes(), &[24, 25, 26, 27, 28, 29, 30, 31]);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(TxHash::digest(b"abc"), TxHash::digest(b"abc"));
        assert_ne!(TxHash::digest(b"abc"), TxHash::digest(b"abd"));
    }

    #[test]
    fn hex_display_parses_back() {
        let hash = TxHash::digest(b"strata");
        let parsed: TxHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn json_uses_hex_string() {
        let hash = TxHash::new([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: TxHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn rejects_short_hex() {
        assert!(matches!(
            "abcd".parse::<TxHash>(),
            Err(ParseError::Length { expected: 32, actual: 2 })
        ));
    }
}
