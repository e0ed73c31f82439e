use strata_ledger::LedgerError;
use strata_processor::ProcessorError;
use strata_store::StoreError;
use strata_store_lmdb::LmdbError;
use strata_transactions::{CodecError, TxType};
use strata_types::{ChainId, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] LmdbError),

    #[error("decode error: {0}")]
    Codec(#[from] CodecError),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("validation worker pool: {0}")]
    WorkerPool(String),

    #[error("block {height} on chain {chain} does not follow applied block {last}")]
    HeightOutOfOrder { chain: ChainId, height: u64, last: u64 },

    #[error("block {height} is not the last applied block of chain {chain} (last: {last:?})")]
    NotTip {
        chain: ChainId,
        height: u64,
        last: Option<u64>,
    },

    #[error("rollback of block {height} on chain {chain} failed at {tx_type}: {source}")]
    RollbackFailed {
        chain: ChainId,
        height: u64,
        tx_type: TxType,
        #[source]
        source: ProcessorError,
    },

    #[error("state corruption on chain {chain} at height {height}: {reason}")]
    StateCorruption {
        chain: ChainId,
        height: u64,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Processor(e) => e.code(),
            Self::Ledger(e) => e.code(),
            Self::Store(StoreError::Corruption(_)) => ErrorCode::StateCorruption,
            Self::Store(_) | Self::Lmdb(_) | Self::Io(_) => ErrorCode::StoreFailure,
            Self::Codec(_) => ErrorCode::SerializeError,
            Self::Config(_) | Self::Metrics(_) | Self::WorkerPool(_) => ErrorCode::ConfigError,
            Self::HeightOutOfOrder { .. } | Self::NotTip { .. } => ErrorCode::OutOfRange,
            Self::RollbackFailed { source, .. } => source.code(),
            Self::StateCorruption { .. } => ErrorCode::StateCorruption,
        }
    }

    /// Block processing for the chain must stop: its state no longer
    /// satisfies the ledger invariants.
    pub fn is_fatal(&self) -> bool {
        self.code().is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corruption_is_fatal_everything_else_is_not() {
        let err = NodeError::StateCorruption {
            chain: ChainId::new(1),
            height: 4,
            reason: "unwind failed".into(),
        };
        assert!(err.is_fatal());
        assert!(!NodeError::Config("bad".into()).is_fatal());
        assert_eq!(
            NodeError::from(ProcessorError::UnknownType(TxType::new(99))).code(),
            ErrorCode::ConfigError
        );
    }
}
