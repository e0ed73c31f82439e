//! Typed view over the per-type payload blob.

use serde::{Deserialize, Serialize};

use crate::agent::RegisterAgentData;
use crate::alias::SetAliasData;
use crate::codec::WireCodec;
use crate::cross_chain::CrossChainData;
use crate::deposit::ChangeDepositData;
use crate::error::TransactionError;
use crate::red_punish::RedPunishData;
use crate::stop_agent::StopAgentData;
use crate::TxType;

/// Every known payload, tagged with its transaction type.
///
/// Used to build transactions (block fixtures, tests). Processors decode the
/// one payload struct they expect with [`crate::Transaction::payload_as`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxPayload {
    Transfer,
    SetAlias(SetAliasData),
    RegisterAgent(RegisterAgentData),
    RedPunish(RedPunishData),
    StopAgent(StopAgentData),
    CrossChainTransfer(CrossChainData),
    AppendDeposit(ChangeDepositData),
    ReduceDeposit(ChangeDepositData),
}

impl TxPayload {
    pub fn tx_type(&self) -> TxType {
        match self {
            Self::Transfer => TxType::TRANSFER,
            Self::SetAlias(_) => TxType::SET_ALIAS,
            Self::RegisterAgent(_) => TxType::REGISTER_AGENT,
            Self::RedPunish(_) => TxType::RED_PUNISH,
            Self::StopAgent(_) => TxType::STOP_AGENT,
            Self::CrossChainTransfer(_) => TxType::CROSS_CHAIN,
            Self::AppendDeposit(_) => TxType::APPEND_DEPOSIT,
            Self::ReduceDeposit(_) => TxType::REDUCE_DEPOSIT,
        }
    }

    /// Wire bytes of the payload. Transfers carry none.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Transfer => Vec::new(),
            Self::SetAlias(d) => d.to_bytes(),
            Self::RegisterAgent(d) => d.to_bytes(),
            Self::RedPunish(d) => d.to_bytes(),
            Self::StopAgent(d) => d.to_bytes(),
            Self::CrossChainTransfer(d) => d.to_bytes(),
            Self::AppendDeposit(d) | Self::ReduceDeposit(d) => d.to_bytes(),
        }
    }

    pub fn decode(tx_type: TxType, bytes: &[u8]) -> Result<Self, TransactionError> {
        Ok(match tx_type {
            TxType::TRANSFER => {
                if !bytes.is_empty() {
                    return Err(crate::CodecError::TrailingBytes(bytes.len()).into());
                }
                Self::Transfer
            }
            TxType::SET_ALIAS => Self::SetAlias(WireCodec::from_bytes(bytes)?),
            TxType::REGISTER_AGENT => Self::RegisterAgent(WireCodec::from_bytes(bytes)?),
            TxType::RED_PUNISH => Self::RedPunish(WireCodec::from_bytes(bytes)?),
            TxType::STOP_AGENT => Self::StopAgent(WireCodec::from_bytes(bytes)?),
            TxType::CROSS_CHAIN => Self::CrossChainTransfer(WireCodec::from_bytes(bytes)?),
            TxType::APPEND_DEPOSIT => Self::AppendDeposit(WireCodec::from_bytes(bytes)?),
            TxType::REDUCE_DEPOSIT => Self::ReduceDeposit(WireCodec::from_bytes(bytes)?),
            other => return Err(TransactionError::UnknownType(other)),
        })
    }
}
