//! Candidate transactions of one block, grouped by type.

use std::collections::{BTreeMap, HashSet};

use strata_transactions::{Transaction, TxType};
use strata_types::TxHash;

/// Per-type batches of a block in declared order.
#[derive(Clone, Debug, Default)]
pub struct BlockTxs {
    by_type: BTreeMap<TxType, Vec<Transaction>>,
}

impl BlockTxs {
    pub fn new(txs: impl IntoIterator<Item = Transaction>) -> Self {
        let mut by_type: BTreeMap<TxType, Vec<Transaction>> = BTreeMap::new();
        for tx in txs {
            by_type.entry(tx.tx_type()).or_default().push(tx);
        }
        Self { by_type }
    }

    /// Transactions of `tx_type`, empty if the block has none.
    pub fn of(&self, tx_type: TxType) -> &[Transaction] {
        self.by_type.get(&tx_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Types present in the block, in commit order. Types without a fixed
    /// priority follow the known ones by tag.
    pub fn types_in_commit_order(&self) -> Vec<TxType> {
        let mut types: Vec<TxType> = self.by_type.keys().copied().collect();
        types.sort_by_key(|t| (t.commit_priority().unwrap_or(usize::MAX), *t));
        types
    }

    /// Every transaction in commit order.
    pub fn iter_commit_order(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.types_in_commit_order()
            .into_iter()
            .flat_map(move |t| self.of(t).iter())
    }

    /// Drop the given transactions; returns how many were removed.
    pub fn remove(&mut self, hashes: &HashSet<TxHash>) -> usize {
        let mut removed = 0;
        for txs in self.by_type.values_mut() {
            let before = txs.len();
            txs.retain(|tx| !hashes.contains(tx.hash()));
            removed += before - txs.len();
        }
        self.by_type.retain(|_, txs| !txs.is_empty());
        removed
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
