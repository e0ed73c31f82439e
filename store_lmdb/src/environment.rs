//! LMDB environment setup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use strata_store::Keyspace;

use crate::kv::LmdbKvStore;
use crate::LmdbError;

/// Wraps the LMDB environment and one database handle per keyspace.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    databases: Arc<HashMap<Keyspace, Database<Bytes, Bytes>>>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path, creating every
    /// keyspace database that does not exist yet.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never modified outside of heed.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(Keyspace::ALL.len() as u32)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let mut databases = HashMap::with_capacity(Keyspace::ALL.len());
        for space in Keyspace::ALL {
            let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(space.name()))?;
            databases.insert(space, db);
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            databases: Arc::new(databases),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// A cheaply cloneable [`strata_store::KvStore`] handle onto this environment.
    pub fn kv_store(&self) -> LmdbKvStore {
        LmdbKvStore::new(Arc::clone(&self.env), Arc::clone(&self.databases))
    }
}
