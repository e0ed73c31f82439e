//! Abstract storage interface for the strata engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements [`KvStore`].
//! The rest of the codebase depends only on the trait. The store offers no
//! transactions or locking: atomicity across keys is the engine's job
//! (commit/rollback with compensation).

pub mod error;
pub mod keyspace;
pub mod kv;

pub use error::StoreError;
pub use keyspace::Keyspace;
pub use kv::{decode_record, KvStore, KvStoreExt};
