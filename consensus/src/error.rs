use strata_store::StoreError;
use strata_transactions::CodecError;
use strata_types::{Amount, ErrorCode, NodeId};
use thiserror::Error;

use crate::agent::AgentStatus;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {0} not found")]
    NotFound(NodeId),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("deposit {total} of agent {id} outside [{min}, {max}]")]
    OutOfRange {
        id: NodeId,
        total: Amount,
        min: Amount,
        max: Amount,
    },

    #[error("agent {id} is {status}")]
    Inactive { id: NodeId, status: AgentStatus },

    #[error("record encoding: {0}")]
    Codec(#[from] CodecError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("inconsistent agent state: {0}")]
    Corrupt(String),
}

impl AgentError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::Inactive { .. } => ErrorCode::AgentInactive,
            Self::Codec(e) => e.code(),
            Self::Storage(StoreError::Corruption(_)) | Self::Corrupt(_) => {
                ErrorCode::StateCorruption
            }
            Self::Storage(_) => ErrorCode::StoreFailure,
        }
    }
}
