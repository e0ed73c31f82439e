use strata_store::StoreError;
use strata_types::{Address, AssetKey, ErrorCode, Nonce};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("nonce mismatch on {account} / {asset}: chain tip is {expected}, spend declares {found}")]
    NonceMismatch {
        account: Address,
        asset: AssetKey,
        expected: Nonce,
        found: Nonce,
    },

    #[error("nonce {nonce} already used on {account} / {asset}")]
    DuplicateNonce {
        account: Address,
        asset: AssetKey,
        nonce: Nonce,
    },

    #[error("no entries on {account} / {asset}")]
    EmptyChain { account: Address, asset: AssetKey },

    #[error("corrupt nonce chain: {0}")]
    CorruptChain(String),

    #[error("alias '{0}' is already taken")]
    AliasTaken(String),

    #[error("address {0} already has an alias")]
    AddressHasAlias(Address),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NonceMismatch { .. } => ErrorCode::NonceMismatch,
            Self::DuplicateNonce { .. } => ErrorCode::DuplicateNonce,
            Self::EmptyChain { .. } => ErrorCode::NotFound,
            Self::CorruptChain(_) => ErrorCode::StateCorruption,
            Self::AliasTaken(_) | Self::AddressHasAlias(_) => ErrorCode::AlreadyExists,
            Self::Storage(StoreError::Corruption(_)) => ErrorCode::StateCorruption,
            Self::Storage(_) => ErrorCode::StoreFailure,
        }
    }
}
