//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! The storage dependency is abstracted behind [`strata_store::KvStore`].
//! This crate provides a test-friendly implementation that:
//! - Keeps everything in memory, in key order
//! - Can be told to fail writes programmatically, to exercise rollback paths
//! - Never touches the filesystem
//!
//! Usage: swap the LMDB store for [`NullStore`] in tests.

pub mod store;

pub use store::{NullStore, StoreSnapshot};
