//! Genesis allocations: balances credited the first time a chain is opened.

use strata_store::{Keyspace, KvStore};
use strata_types::ChainConfig;

use crate::error::LedgerError;
use crate::ledger::NonceChainLedger;

const GENESIS_MARKER_PREFIX: &[u8] = b"genesis_applied:";

fn marker_key(config: &ChainConfig) -> Vec<u8> {
    let mut key = GENESIS_MARKER_PREFIX.to_vec();
    key.extend_from_slice(&config.chain_id.to_be_bytes());
    key
}

/// Credit the chain's genesis allocations unless that already happened.
/// Returns whether anything was credited.
pub fn apply_genesis(
    ledger: &NonceChainLedger,
    store: &dyn KvStore,
    config: &ChainConfig,
) -> Result<bool, LedgerError> {
    let marker = marker_key(config);
    if store.exists(Keyspace::Meta, &marker)? {
        return Ok(false);
    }
    for alloc in &config.genesis {
        let asset = alloc.asset.unwrap_or_else(|| config.staking_asset());
        ledger.credit(&alloc.address, &asset, &alloc.amount)?;
        tracing::info!(
            chain = %config.chain_id,
            address = %alloc.address,
            %asset,
            amount = %alloc.amount,
            "genesis allocation"
        );
    }
    store.put(Keyspace::Meta, &marker, &[1])?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_nullables::NullStore;
    use strata_types::{Address, Amount, ChainId, GenesisAllocation};

    #[test]
    fn genesis_is_applied_once() {
        let store = Arc::new(NullStore::new());
        let ledger = NonceChainLedger::new(store.clone());
        let mut config = ChainConfig::new(ChainId::new(1));
        let alice = Address::new(ChainId::new(1), [1; 20]);
        config.genesis.push(GenesisAllocation {
            address: alice,
            asset: None,
            amount: Amount::from(1000u32),
        });

        assert!(apply_genesis(&ledger, store.as_ref(), &config).unwrap());
        assert!(!apply_genesis(&ledger, store.as_ref(), &config).unwrap());
        assert_eq!(
            ledger.current_balance(&alice, &config.staking_asset()).unwrap(),
            Amount::from(1000u32)
        );
    }
}
