//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node applies
//! any block.

use std::path::Path;

use strata_store::Keyspace;

use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Open each keyspace database and count its entries. Read failures and
/// missing databases are recorded in the report rather than returned.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let env = env.env();
    let rtxn = env.read_txn()?;

    for space in Keyspace::ALL {
        let name = space.name();
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{name}': {e}")),
                }
            }
            Ok(None) => report.errors.push(format!("database '{name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{name}': {e}")),
        }
    }

    Ok(report)
}

/// Check that an LMDB data directory looks valid before opening it.
///
/// A nonexistent directory is a fresh start. An existing directory without
/// `data.mdb` suggests corruption or a wrong path.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::KvStore;

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("missing")).is_ok());
    }

    #[test]
    fn check_data_dir_without_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        env.kv_store().put(Keyspace::Agents, b"a", b"1").unwrap();
        env.kv_store().put(Keyspace::Aliases, b"b", b"2").unwrap();

        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "errors: {:?}", report.errors);
        assert_eq!(report.databases_checked as usize, Keyspace::ALL.len());
        assert_eq!(report.total_entries, 2);
        assert!(check_data_dir(dir.path()).is_ok());
    }
}
