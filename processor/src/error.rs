use strata_consensus::AgentError;
use strata_ledger::LedgerError;
use strata_store::StoreError;
use strata_transactions::{CodecError, TransactionError, TxType};
use strata_types::{Address, Amount, AssetKey, ChainId, ErrorCode, TxHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("chain {0} does not exist")]
    ChainNotExist(ChainId),

    #[error("chain {0} configured twice")]
    DuplicateChain(ChainId),

    #[error("no processor registered for transaction type {0}")]
    UnknownType(TxType),

    #[error("processor for transaction type {0} registered twice")]
    DuplicateProcessor(TxType),

    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("insufficient balance on {account} / {asset}: {available} available, {required} required")]
    InsufficientBalance {
        account: Address,
        asset: AssetKey,
        available: Amount,
        required: Amount,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("payload error: {0}")]
    Codec(#[from] CodecError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("state corruption: {0}")]
    StateCorruption(String),
}

impl ProcessorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ChainNotExist(_) => ErrorCode::ChainNotExist,
            Self::DuplicateChain(_) | Self::UnknownType(_) | Self::DuplicateProcessor(_) => {
                ErrorCode::ConfigError
            }
            Self::Parameter(_) => ErrorCode::ParameterError,
            Self::OutOfRange(_) => ErrorCode::OutOfRange,
            Self::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            Self::Conflict(_) => ErrorCode::ConflictError,
            Self::Transaction(e) => e.code(),
            Self::Codec(e) => e.code(),
            Self::Ledger(e) => e.code(),
            Self::Agent(e) => e.code(),
            Self::Store(StoreError::Corruption(_)) => ErrorCode::StateCorruption,
            Self::Store(_) => ErrorCode::StoreFailure,
            Self::StateCorruption(_) => ErrorCode::StateCorruption,
        }
    }

    /// Whether state can no longer be trusted after this error.
    pub fn is_fatal(&self) -> bool {
        self.code().is_fatal()
    }
}

/// A transaction removed from a block, with the first rule it broke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub tx_hash: TxHash,
    pub tx_type: TxType,
    pub code: ErrorCode,
    pub reason: String,
}

impl Rejection {
    pub fn new(
        tx_hash: TxHash,
        tx_type: TxType,
        code: ErrorCode,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            tx_hash,
            tx_type,
            code,
            reason: reason.into(),
        }
    }

    pub fn from_error(tx_hash: TxHash, tx_type: TxType, error: &ProcessorError) -> Self {
        Self::new(tx_hash, tx_type, error.code(), error.to_string())
    }
}
