//! Chain bootstrap: open each configured chain's store, bring its schema up
//! to date, check it, and credit genesis allocations on first start.

use std::sync::Arc;

use strata_ledger::apply_genesis;
use strata_processor::{ChainContext, EngineContext};
use strata_store::{KvStore, StoreError};
use strata_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment, Migrator};
use strata_types::ChainConfig;

use crate::config::NodeConfig;
use crate::NodeError;

/// Build the context of one chain on top of an already opened store.
pub fn bootstrap_chain(
    config: ChainConfig,
    store: Arc<dyn KvStore>,
) -> Result<ChainContext, NodeError> {
    config.check().map_err(NodeError::Config)?;
    let chain = ChainContext::new(config, store);
    let credited = apply_genesis(chain.ledger(), chain.store().as_ref(), chain.config())?;
    tracing::info!(
        chain = %chain.chain_id(),
        name = %chain.config().name,
        genesis_applied = credited,
        "chain ready"
    );
    Ok(chain)
}

/// Open one LMDB environment per configured chain under `data_dir` and
/// build the engine context from them.
pub fn open_chains(config: &NodeConfig) -> Result<EngineContext, NodeError> {
    config.check()?;
    let mut engine = EngineContext::new();
    for chain in &config.chains {
        let dir = config.chain_dir(chain);
        check_data_dir(&dir).map_err(StoreError::Corruption)?;
        let env = LmdbEnvironment::open(&dir, config.lmdb_map_size)?;
        let store = env.kv_store();
        Migrator::run(&store)?;

        let report = check_integrity(&env)?;
        if !report.is_healthy() {
            return Err(StoreError::Corruption(format!(
                "chain {}: {}",
                chain.chain_id,
                report.errors.join("; ")
            ))
            .into());
        }
        tracing::info!(
            chain = %chain.chain_id,
            path = %dir.display(),
            databases = report.databases_checked,
            entries = report.total_entries,
            "store integrity check passed"
        );

        engine.insert(bootstrap_chain(chain.clone(), Arc::new(store))?)?;
    }
    Ok(engine)
}
