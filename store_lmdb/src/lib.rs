//! LMDB storage backend for the strata engine.
//!
//! Implements [`strata_store::KvStore`] using the `heed` LMDB bindings.
//! Each [`strata_store::Keyspace`] maps to one LMDB database within a single
//! environment. Every `put`/`delete` is its own LMDB write transaction: the
//! engine provides cross-key atomicity itself.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod kv;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use kv::LmdbKvStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
