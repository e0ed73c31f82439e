//! The key-value store trait and typed helpers on top of it.

use crate::{Keyspace, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Synchronous key-value store keyed by composite byte keys.
///
/// Implementations must be safe to share across threads: validation reads
/// the store from parallel workers while commits are serialized by the
/// block orchestrator.
pub trait KvStore: Send + Sync {
    fn get(&self, space: Keyspace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, space: Keyspace, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Returns whether the key existed.
    fn delete(&self, space: Keyspace, key: &[u8]) -> Result<bool, StoreError>;

    /// All `(key, value)` pairs whose key starts with `prefix`, in key order.
    fn scan_prefix(
        &self,
        space: Keyspace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn exists(&self, space: Keyspace, key: &[u8]) -> Result<bool, StoreError> {
        self.get(space, key).map(|v| v.is_some())
    }

    /// Number of entries in a keyspace.
    fn count(&self, space: Keyspace) -> Result<u64, StoreError> {
        self.scan_prefix(space, &[]).map(|v| v.len() as u64)
    }
}

/// Decode a bincode record read from a store.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Bincode-typed access to any [`KvStore`].
pub trait KvStoreExt: KvStore {
    fn get_record<T: DeserializeOwned>(
        &self,
        space: Keyspace,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        match self.get(space, key)? {
            Some(bytes) => decode_record(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn put_record<T: Serialize>(
        &self,
        space: Keyspace,
        key: &[u8],
        record: &T,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record)?;
        self.put(space, key, &bytes)
    }

    /// Schema version stored in the meta keyspace (0 for a fresh store).
    fn schema_version(&self) -> Result<u32, StoreError> {
        match self.get(Keyspace::Meta, SCHEMA_VERSION_KEY)? {
            Some(bytes) if bytes.len() == 4 => {
                let mut arr = [0u8; 4];
                arr.copy_from_slice(&bytes);
                Ok(u32::from_le_bytes(arr))
            }
            Some(_) => Err(StoreError::Corruption(
                "schema_version has unexpected byte length".to_string(),
            )),
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put(Keyspace::Meta, SCHEMA_VERSION_KEY, &version.to_le_bytes())
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}
