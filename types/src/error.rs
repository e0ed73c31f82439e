//! Engine-wide error codes and parse errors shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Representative error code attached to a rejected transaction or a failed
/// commit/rollback.
///
/// Every crate-level error enum maps onto one of these through a `code()`
/// method, so the orchestrator can report rejections uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed or missing fields.
    ParameterError,
    /// Referenced node, alias, or account is absent.
    NotFound,
    /// Declared `fromNonce` does not match the chain tip.
    NonceMismatch,
    /// The produced nonce already exists for the (account, asset) pair.
    DuplicateNonce,
    /// Deposit bound violation.
    OutOfRange,
    /// Intra-block cross-type conflict.
    ConflictError,
    /// Payload parse failure.
    SerializeError,
    /// Unknown chain id.
    ChainNotExist,
    /// Spendable balance is lower than the debit.
    InsufficientBalance,
    /// The target node is stopped or punished.
    AgentInactive,
    /// The alias or agent address is already registered.
    AlreadyExists,
    /// No processor is registered for the transaction type tag.
    ConfigError,
    /// A compensating action failed; on-disk state can no longer be trusted.
    StateCorruption,
    /// The key-value store failed underneath the engine.
    StoreFailure,
}

impl ErrorCode {
    /// Stable wire/log representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParameterError => "parameter_error",
            Self::NotFound => "not_found",
            Self::NonceMismatch => "nonce_mismatch",
            Self::DuplicateNonce => "duplicate_nonce",
            Self::OutOfRange => "out_of_range",
            Self::ConflictError => "conflict_error",
            Self::SerializeError => "serialize_error",
            Self::ChainNotExist => "chain_not_exist",
            Self::InsufficientBalance => "insufficient_balance",
            Self::AgentInactive => "agent_inactive",
            Self::AlreadyExists => "already_exists",
            Self::ConfigError => "config_error",
            Self::StateCorruption => "state_corruption",
            Self::StoreFailure => "store_failure",
        }
    }

    /// Whether this code signals that node state may be inconsistent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StateCorruption)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to parse one of the textual representations in this crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("invalid address: {0}")]
    Address(String),

    #[error("invalid amount: {0}")]
    Amount(String),
}
