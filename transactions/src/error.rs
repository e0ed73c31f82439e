use strata_types::{Address, AssetKey, ErrorCode};
use thiserror::Error;

use crate::TxType;

/// Failure to decode a wire value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("declared length {declared} exceeds the {remaining} bytes left")]
    LengthOverflow { declared: u64, remaining: usize },

    #[error("invalid utf-8 string")]
    InvalidUtf8,

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl CodecError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::SerializeError
    }
}

/// Stateless structural problems with a transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("transaction spends nothing")]
    NoInputs,

    #[error("input {address} / {asset} appears more than once")]
    DuplicateInput { address: Address, asset: AssetKey },

    #[error("remark of {len} bytes exceeds the {max}-byte limit")]
    RemarkTooLong { len: usize, max: usize },

    #[error("no processor registered for transaction type {0}")]
    UnknownType(TxType),

    #[error("payload: {0}")]
    Codec(#[from] CodecError),

    #[error("{0}")]
    Other(String),
}

impl TransactionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Codec(e) => e.code(),
            Self::UnknownType(_) => ErrorCode::ConfigError,
            _ => ErrorCode::ParameterError,
        }
    }
}
