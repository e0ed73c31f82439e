//! Transaction processors and intra-block conflict detection.
//!
//! Each transaction type has one [`TransactionProcessor`] registered in a
//! [`ProcessorRegistry`]. Processors validate against committed state and
//! apply changes only through a [`Journal`], so every committed batch can be
//! undone, and every rolled-back batch redone, without per-type undo logic.
//!
//! - [`context`]: [`EngineContext`] and the per-chain [`ChainContext`].
//! - [`batch`]: candidate transactions of a block grouped by type.
//! - [`conflict`]: cross-type conflict detection before validation.
//! - [`coin_check`]: in-block simulation of nonce-chain debits.
//! - [`journal`]: reversible changes and their compensations.
//! - [`processors`]: the built-in transaction types.

pub mod batch;
pub mod coin_check;
pub mod conflict;
pub mod context;
pub mod error;
pub mod journal;
pub mod processor;
pub mod processors;
pub mod registry;

pub use batch::BlockTxs;
pub use coin_check::CoinDataChecker;
pub use conflict::ConflictDetector;
pub use context::{ChainContext, EngineContext};
pub use error::{ProcessorError, Rejection};
pub use journal::{Compensation, Journal};
pub use processor::{representative_code, TransactionProcessor};
pub use registry::ProcessorRegistry;
