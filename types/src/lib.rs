//! Fundamental types for the strata transaction-application engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! chain and asset identifiers, addresses, nonces, hashes, arbitrary-precision amounts,
//! block headers, per-chain configuration, and the engine-wide error codes.

pub mod address;
pub mod amount;
pub mod asset;
pub mod block;
pub mod error;
pub mod hash;
pub mod nonce;
pub mod params;
pub mod time;

pub use address::Address;
pub use amount::Amount;
pub use asset::{AssetKey, ChainId};
pub use block::{BlockHash, BlockHeader};
pub use error::{ErrorCode, ParseError};
pub use hash::{NodeId, TxHash};
pub use nonce::Nonce;
pub use params::{ChainConfig, DepositBounds, GenesisAllocation};
pub use time::Timestamp;
