//! LMDB implementation of KvStore.
//!
//! Keys are the raw composite byte keys built by the engine; prefix scans
//! use a half-open LMDB range `[prefix, increment(prefix))`.

use std::collections::HashMap;
use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use strata_store::{Keyspace, KvStore, StoreError};

use crate::LmdbError;

#[derive(Clone)]
pub struct LmdbKvStore {
    env: Arc<Env>,
    databases: Arc<HashMap<Keyspace, Database<Bytes, Bytes>>>,
}

impl LmdbKvStore {
    pub(crate) fn new(
        env: Arc<Env>,
        databases: Arc<HashMap<Keyspace, Database<Bytes, Bytes>>>,
    ) -> Self {
        Self { env, databases }
    }

    fn db(&self, space: Keyspace) -> Result<Database<Bytes, Bytes>, StoreError> {
        self.databases
            .get(&space)
            .copied()
            .ok_or_else(|| StoreError::Backend(format!("keyspace {space} not opened")))
    }
}

/// Smallest key strictly greater than every key starting with `prefix`,
/// or `None` when no such key exists (empty or all-0xff prefix).
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < 0xff {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

impl KvStore for LmdbKvStore {
    fn get(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let db = self.db(space)?;
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }

    fn put(&self, space: Keyspace, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let db = self.db(space)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        db.put(&mut wtxn, key, value).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete(&self, space: Keyspace, key: &[u8]) -> Result<bool, StoreError> {
        let db = self.db(space)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = db.delete(&mut wtxn, key).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn scan_prefix(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let db = self.db(space)?;
        let upper = prefix_upper_bound(prefix);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bounds = (
            Bound::Included(prefix),
            match upper.as_deref() {
                Some(u) => Bound::Excluded(u),
                None => Bound::Unbounded,
            },
        );
        let iter = db.range(&rtxn, &bounds).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (key, val) = entry.map_err(LmdbError::from)?;
            results.push((key.to_vec(), val.to_vec()));
        }
        Ok(results)
    }

    fn count(&self, space: Keyspace) -> Result<u64, StoreError> {
        let db = self.db(space)?;
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("failed to open env");
        (dir, env)
    }

    #[test]
    fn upper_bound_increments_last_byte() {
        assert_eq!(prefix_upper_bound(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_upper_bound(&[1, 0xff]), Some(vec![2]));
        assert_eq!(prefix_upper_bound(&[0xff, 0xff]), None);
        assert_eq!(prefix_upper_bound(&[]), None);
    }

    #[test]
    fn put_get_delete_roundtrip() {
        let (_dir, env) = temp_env();
        let store = env.kv_store();
        store.put(Keyspace::Agents, b"node-1", b"record").unwrap();
        assert_eq!(
            store.get(Keyspace::Agents, b"node-1").unwrap(),
            Some(b"record".to_vec())
        );
        // Keyspaces are isolated.
        assert!(store.get(Keyspace::Aliases, b"node-1").unwrap().is_none());
        assert!(store.delete(Keyspace::Agents, b"node-1").unwrap());
        assert!(!store.delete(Keyspace::Agents, b"node-1").unwrap());
        assert!(store.get(Keyspace::Agents, b"node-1").unwrap().is_none());
    }

    #[test]
    fn scan_prefix_returns_only_matching_keys_in_order() {
        let (_dir, env) = temp_env();
        let store = env.kv_store();
        store.put(Keyspace::LedgerEntries, &[1, 2, 9], b"c").unwrap();
        store.put(Keyspace::LedgerEntries, &[1, 2, 3], b"a").unwrap();
        store.put(Keyspace::LedgerEntries, &[1, 3, 0], b"x").unwrap();
        store.put(Keyspace::LedgerEntries, &[1, 1, 0xff], b"y").unwrap();

        let found = store.scan_prefix(Keyspace::LedgerEntries, &[1, 2]).unwrap();
        let keys: Vec<_> = found.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![vec![1, 2, 3], vec![1, 2, 9]]);
        assert_eq!(store.count(Keyspace::LedgerEntries).unwrap(), 4);
        assert_eq!(store.scan_prefix(Keyspace::LedgerEntries, &[]).unwrap().len(), 4);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
            env.kv_store().put(Keyspace::Meta, b"k", b"v").unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        assert_eq!(env.kv_store().get(Keyspace::Meta, b"k").unwrap(), Some(b"v".to_vec()));
    }
}
