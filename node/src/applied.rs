//! Record of the blocks applied to a chain, kept so a reorganization can
//! roll them back later.
//!
//! Each record holds the header and the transactions that were actually
//! committed, in commit order. The meta keyspace holds the height of the
//! last applied block; every record links to the one applied before it.

use serde::{Deserialize, Serialize};

use strata_store::{Keyspace, KvStore, KvStoreExt, StoreError};
use strata_transactions::{CodecError, Transaction, WireCodec};
use strata_types::BlockHeader;

const TIP_KEY: &[u8] = b"applied_tip";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedBlock {
    pub header: BlockHeader,
    /// Height of the block applied before this one.
    pub previous: Option<u64>,
    /// Wire encoding of each committed transaction.
    transactions: Vec<Vec<u8>>,
}

impl AppliedBlock {
    pub fn new<'a>(
        header: BlockHeader,
        previous: Option<u64>,
        txs: impl IntoIterator<Item = &'a Transaction>,
    ) -> Self {
        Self {
            header,
            previous,
            transactions: txs.into_iter().map(WireCodec::to_bytes).collect(),
        }
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>, CodecError> {
        self.transactions
            .iter()
            .map(|bytes| Transaction::from_bytes(bytes))
            .collect()
    }
}

fn key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

/// Height of the last applied block.
pub fn tip(store: &dyn KvStore) -> Result<Option<u64>, StoreError> {
    store.get_record(Keyspace::Meta, TIP_KEY)
}

pub fn load(store: &dyn KvStore, height: u64) -> Result<Option<AppliedBlock>, StoreError> {
    store.get_record(Keyspace::AppliedBlocks, &key(height))
}

/// Every applied block, lowest height first.
pub fn all(store: &dyn KvStore) -> Result<Vec<AppliedBlock>, StoreError> {
    store
        .scan_prefix(Keyspace::AppliedBlocks, &[])?
        .iter()
        .map(|(_, bytes)| strata_store::decode_record(bytes))
        .collect()
}

/// Store `block` and make it the tip.
pub fn push(store: &dyn KvStore, block: &AppliedBlock) -> Result<(), StoreError> {
    store.put_record(Keyspace::AppliedBlocks, &key(block.height()), block)?;
    if let Err(e) = store.put_record(Keyspace::Meta, TIP_KEY, &block.height()) {
        store.delete(Keyspace::AppliedBlocks, &key(block.height()))?;
        return Err(e);
    }
    Ok(())
}

/// Drop `block` and make `block.previous` the tip again. On failure the
/// record and the tip are left as they were, or `Corruption` is returned
/// when the record could not be put back.
pub fn pop(store: &dyn KvStore, block: &AppliedBlock) -> Result<(), StoreError> {
    store.delete(Keyspace::AppliedBlocks, &key(block.height()))?;
    let moved = match block.previous {
        Some(previous) => store.put_record(Keyspace::Meta, TIP_KEY, &previous),
        None => store.delete(Keyspace::Meta, TIP_KEY).map(|_| ()),
    };
    if let Err(e) = moved {
        let restored = store.put_record(Keyspace::AppliedBlocks, &key(block.height()), block);
        if let Err(restore) = restored {
            return Err(StoreError::Corruption(format!(
                "applied block {} lost while its tip remains ({e}; {restore})",
                block.height()
            )));
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nullables::NullStore;
    use strata_transactions::{CoinData, TxPayload};
    use strata_types::{BlockHash, ChainId, Timestamp};

    fn header(height: u64) -> BlockHeader {
        BlockHeader::new(height, Timestamp::new(height * 10), BlockHash::new([height as u8; 32]))
    }

    #[test]
    fn push_and_pop_move_the_tip() {
        let store = NullStore::new();
        let tx = Transaction::from_payload(
            ChainId::new(1),
            Timestamp::new(5),
            &TxPayload::Transfer,
            CoinData::default(),
        );
        let first = AppliedBlock::new(header(1), None, std::iter::empty());
        let second = AppliedBlock::new(header(2), Some(1), [&tx]);

        push(&store, &first).unwrap();
        push(&store, &second).unwrap();
        assert_eq!(tip(&store).unwrap(), Some(2));
        assert_eq!(all(&store).unwrap().len(), 2);

        let loaded = load(&store, 2).unwrap().unwrap();
        assert_eq!(loaded.transactions().unwrap(), vec![tx]);

        pop(&store, &loaded).unwrap();
        assert_eq!(tip(&store).unwrap(), Some(1));
        pop(&store, &first).unwrap();
        assert_eq!(tip(&store).unwrap(), None);
        assert!(all(&store).unwrap().is_empty());
    }

    #[test]
    fn failed_tip_write_leaves_no_record() {
        let store = NullStore::new();
        store.fail_writes_to(Keyspace::Meta);
        assert!(push(&store, &AppliedBlock::new(header(1), None, std::iter::empty())).is_err());
        store.clear_faults();
        assert!(load(&store, 1).unwrap().is_none());
    }

    #[test]
    fn failed_pop_keeps_record_and_tip() {
        let store = NullStore::new();
        let first = AppliedBlock::new(header(1), None, std::iter::empty());
        let second = AppliedBlock::new(header(2), Some(1), std::iter::empty());
        push(&store, &first).unwrap();
        push(&store, &second).unwrap();

        for space in [Keyspace::AppliedBlocks, Keyspace::Meta] {
            store.fail_writes_to(space);
            assert!(pop(&store, &second).is_err());
            store.clear_faults();
            assert_eq!(tip(&store).unwrap(), Some(2));
            assert_eq!(load(&store, 2).unwrap(), Some(second.clone()));
        }
    }

    #[test]
    fn unrestorable_pop_is_corruption() {
        let store = NullStore::new();
        let only = AppliedBlock::new(header(1), None, std::iter::empty());
        push(&store, &only).unwrap();

        // The record delete succeeds; the tip delete and the restore fail.
        store.fail_after_writes(1);
        assert!(matches!(pop(&store, &only), Err(StoreError::Corruption(_))));
    }
}
