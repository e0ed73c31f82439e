//! Transaction wire format for the strata engine.
//!
//! Transaction types and their payloads:
//! - **Transfer** (2): coin data only
//! - **SetAlias** (3): bind a human-readable alias to an address
//! - **RegisterAgent** (4): register a consensus agent with a locked deposit
//! - **RedPunish** (8): disable a misbehaving agent
//! - **StopAgent** (9): stop an agent and unlock its deposit
//! - **CrossChainTransfer** (10): send coins to another chain
//! - **AppendDeposit** (28) / **ReduceDeposit** (29): change an agent's deposit

pub mod agent;
pub mod alias;
pub mod codec;
pub mod coin;
pub mod cross_chain;
pub mod deposit;
pub mod error;
pub mod payload;
pub mod red_punish;
pub mod stop_agent;
pub mod transaction;
pub mod tx_type;
pub mod validation;

pub use agent::RegisterAgentData;
pub use alias::SetAliasData;
pub use codec::{Decoder, Encoder, WireCodec};
pub use coin::{CoinData, CoinFrom, CoinTo};
pub use cross_chain::CrossChainData;
pub use deposit::ChangeDepositData;
pub use error::{CodecError, TransactionError};
pub use payload::TxPayload;
pub use red_punish::RedPunishData;
pub use stop_agent::StopAgentData;
pub use transaction::Transaction;
pub use tx_type::TxType;

/// Serde helper: byte vectors as hex strings.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
