//! Explicit per-chain state handed to every engine call.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_consensus::AgentManager;
use strata_ledger::{AliasStore, NonceChainLedger};
use strata_store::KvStore;
use strata_types::{ChainConfig, ChainId};

use crate::error::ProcessorError;

/// Configuration and state owners of one chain.
///
/// Built once at startup. The configuration is read-only afterwards; all
/// state changes go through the ledger, alias store and agent manager.
#[derive(Clone)]
pub struct ChainContext {
    config: ChainConfig,
    store: Arc<dyn KvStore>,
    ledger: NonceChainLedger,
    aliases: AliasStore,
    agents: AgentManager,
}

impl ChainContext {
    pub fn new(config: ChainConfig, store: Arc<dyn KvStore>) -> Self {
        Self {
            ledger: NonceChainLedger::new(store.clone()),
            aliases: AliasStore::new(store.clone()),
            agents: AgentManager::new(store.clone()),
            config,
            store,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.config.chain_id
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn ledger(&self) -> &NonceChainLedger {
        &self.ledger
    }

    pub fn aliases(&self) -> &AliasStore {
        &self.aliases
    }

    pub fn agents(&self) -> &AgentManager {
        &self.agents
    }
}

/// Every chain served by this node, keyed by chain id.
#[derive(Clone, Default)]
pub struct EngineContext {
    chains: BTreeMap<ChainId, ChainContext>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chain: ChainContext) -> Result<(), ProcessorError> {
        let id = chain.chain_id();
        if self.chains.contains_key(&id) {
            return Err(ProcessorError::DuplicateChain(id));
        }
        self.chains.insert(id, chain);
        Ok(())
    }

    pub fn chain(&self, id: ChainId) -> Result<&ChainContext, ProcessorError> {
        self.chains.get(&id).ok_or(ProcessorError::ChainNotExist(id))
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainContext> {
        self.chains.values()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
