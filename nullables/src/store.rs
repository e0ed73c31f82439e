//! Nullable store: thread-safe in-memory key-value storage for testing.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use strata_store::{Keyspace, KvStore, StoreError};

/// Full copy of the store contents, for before/after comparisons.
pub type StoreSnapshot = BTreeMap<Keyspace, BTreeMap<Vec<u8>, Vec<u8>>>;

/// An in-memory [`KvStore`] with programmable write failures.
/// Thread-safe so parallel validation can read it.
pub struct NullStore {
    spaces: Mutex<StoreSnapshot>,
    /// `Some(n)`: the next `n` writes succeed, every write after that fails.
    writes_until_failure: Mutex<Option<u64>>,
    /// Writes into these keyspaces always fail.
    failing_spaces: Mutex<HashSet<Keyspace>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            spaces: Mutex::new(BTreeMap::new()),
            writes_until_failure: Mutex::new(None),
            failing_spaces: Mutex::new(HashSet::new()),
        }
    }

    /// Let the next `n` writes (puts or deletes) succeed and fail all later ones.
    pub fn fail_after_writes(&self, n: u64) {
        *self.writes_until_failure.lock().unwrap() = Some(n);
    }

    /// Fail every write into `space` until [`NullStore::clear_faults`].
    pub fn fail_writes_to(&self, space: Keyspace) {
        self.failing_spaces.lock().unwrap().insert(space);
    }

    pub fn clear_faults(&self) {
        *self.writes_until_failure.lock().unwrap() = None;
        self.failing_spaces.lock().unwrap().clear();
    }

    /// Copy of everything currently stored. Empty keyspaces are omitted so
    /// that "wrote then deleted" compares equal to "never wrote".
    pub fn snapshot(&self) -> StoreSnapshot {
        self.spaces
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(space, entries)| (*space, entries.clone()))
            .collect()
    }

    fn check_write(&self, space: Keyspace) -> Result<(), StoreError> {
        if self.failing_spaces.lock().unwrap().contains(&space) {
            tracing::debug!(%space, "null store: injected keyspace failure");
            return Err(StoreError::Backend(format!("injected failure writing {space}")));
        }
        let mut remaining = self.writes_until_failure.lock().unwrap();
        match remaining.as_mut() {
            Some(0) => {
                tracing::debug!(%space, "null store: injected write-budget failure");
                Err(StoreError::Backend(format!("injected failure writing {space}")))
            }
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for NullStore {
    fn get(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .spaces
            .lock()
            .unwrap()
            .get(&space)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn put(&self, space: Keyspace, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_write(space)?;
        self.spaces
            .lock()
            .unwrap()
            .entry(space)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, space: Keyspace, key: &[u8]) -> Result<bool, StoreError> {
        self.check_write(space)?;
        Ok(self
            .spaces
            .lock()
            .unwrap()
            .get_mut(&space)
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false))
    }

    fn scan_prefix(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let spaces = self.spaces.lock().unwrap();
        let Some(entries) = spaces.get(&space) else {
            return Ok(Vec::new());
        };
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
