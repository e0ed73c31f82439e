//! Pre-built [`tracing::Span`] constructors for block processing.
//!
//! Consistent span names and field sets make it easy to filter and
//! correlate the steps of one block across log lines.

use strata_transactions::TxType;
use strata_types::{BlockHeader, ChainId};
use tracing::{info_span, Span};

/// Span covering conflict checking, validation and commit of one block.
pub fn block_apply_span(chain: ChainId, header: &BlockHeader, tx_count: usize) -> Span {
    info_span!(
        "block_apply",
        chain = %chain,
        height = header.height,
        hash = %header.hash,
        txs = tx_count
    )
}

/// Span covering the rollback of one applied block.
pub fn block_rollback_span(chain: ChainId, height: u64) -> Span {
    info_span!("block_rollback", chain = %chain, height = height)
}

/// Span covering the commit of one type batch.
pub fn type_commit_span(tx_type: TxType, tx_count: usize) -> Span {
    info_span!("type_commit", tx_type = %tx_type, txs = tx_count)
}

/// Span covering validation of one type batch on a worker thread.
pub fn type_validate_span(tx_type: TxType, tx_count: usize) -> Span {
    info_span!("type_validate", tx_type = %tx_type, txs = tx_count)
}
