//! Nonce-chained account ledger.
//!
//! Each (account, asset) pair owns a singly linked chain of debit entries
//! keyed by nonce. A spend must build on the current tip (`from_nonce`)
//! and occupy a nonce never used on that chain, which orders pending spends
//! deterministically and rules out double spends. Credits are tracked as a
//! per-pair total beside the chain.

pub mod account_chain;
pub mod alias;
pub mod entry;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod snapshot;

pub use account_chain::AccountChain;
pub use alias::AliasStore;
pub use entry::{AccountState, BalanceEntry};
pub use error::LedgerError;
pub use genesis::apply_genesis;
pub use ledger::NonceChainLedger;
pub use snapshot::{AccountSnapshot, LedgerSnapshot};
