//! The contract every transaction type implements.

use strata_transactions::{Transaction, TxType};
use strata_types::{BlockHeader, ErrorCode};

use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::{ProcessorError, Rejection};
use crate::journal::Journal;

/// Validation, commit and rollback for one transaction type.
///
/// Implementations provide the per-transaction steps; batch semantics
/// (reject lists, all-or-nothing commit and rollback) come from the
/// provided methods and are the same for every type.
pub trait TransactionProcessor: Send + Sync {
    fn tx_type(&self) -> TxType;

    /// Check one transaction against committed state. Must not write.
    ///
    /// `block` holds every candidate of the block being built, for checks
    /// that depend on other transactions. `header` is `None` while a block
    /// is still being assembled.
    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        block: &BlockTxs,
        header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError>;

    /// Apply one transaction, performing every change through `journal`.
    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError>;

    /// Reverse one committed transaction, performing every change through
    /// `journal`.
    fn rollback_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError>;

    /// Transactions of `txs` that fail, each with the first rule it broke.
    /// Transactions not returned are valid.
    fn validate(
        &self,
        chain: &ChainContext,
        txs: &[Transaction],
        block: &BlockTxs,
        header: Option<&BlockHeader>,
    ) -> Vec<Rejection> {
        txs.iter()
            .filter_map(|tx| {
                let result = if tx.chain_id() != chain.chain_id() {
                    Err(ProcessorError::Parameter(format!(
                        "transaction for chain {} in a block of chain {}",
                        tx.chain_id(),
                        chain.chain_id()
                    )))
                } else if tx.tx_type() != self.tx_type() {
                    Err(ProcessorError::Parameter(format!(
                        "{} transaction handed to the {} processor",
                        tx.tx_type(),
                        self.tx_type()
                    )))
                } else {
                    self.check(chain, tx, block, header)
                };
                result.err().map(|e| {
                    tracing::warn!(
                        tx = %tx.hash(),
                        tx_type = %tx.tx_type(),
                        code = %e.code(),
                        error = %e,
                        "transaction rejected"
                    );
                    Rejection::from_error(*tx.hash(), tx.tx_type(), &e)
                })
            })
            .collect()
    }

    /// Commit `txs` in order. If one fails, everything this call already
    /// applied is unwound before the error is returned.
    ///
    /// On success the returned journal reverses the whole batch.
    fn commit(
        &self,
        chain: &ChainContext,
        txs: &[Transaction],
        header: &BlockHeader,
    ) -> Result<Journal, ProcessorError> {
        let mut journal = Journal::new();
        for tx in txs {
            if let Err(e) = self.commit_tx(chain, tx, header, &mut journal) {
                tracing::warn!(
                    tx = %tx.hash(),
                    tx_type = %self.tx_type(),
                    height = header.height,
                    error = %e,
                    "commit failed, unwinding batch"
                );
                journal.unwind(chain)?;
                return Err(e);
            }
            tracing::debug!(
                tx = %tx.hash(),
                tx_type = %self.tx_type(),
                height = header.height,
                "committed"
            );
        }
        Ok(journal)
    }

    /// Roll back `txs`, last first. If one fails, the transactions this
    /// call already rolled back are committed again.
    ///
    /// On success the returned journal re-applies the whole batch.
    fn rollback(
        &self,
        chain: &ChainContext,
        txs: &[Transaction],
        header: &BlockHeader,
    ) -> Result<Journal, ProcessorError> {
        let mut journal = Journal::new();
        for tx in txs.iter().rev() {
            if let Err(e) = self.rollback_tx(chain, tx, header, &mut journal) {
                tracing::warn!(
                    tx = %tx.hash(),
                    tx_type = %self.tx_type(),
                    height = header.height,
                    error = %e,
                    "rollback failed, re-applying batch"
                );
                journal.unwind(chain)?;
                return Err(e);
            }
            tracing::debug!(
                tx = %tx.hash(),
                tx_type = %self.tx_type(),
                height = header.height,
                "rolled back"
            );
        }
        Ok(journal)
    }
}

/// The representative code of a rejection list: the first one's.
pub fn representative_code(rejections: &[Rejection]) -> Option<ErrorCode> {
    rejections.first().map(|r| r.code)
}
