//! Account aliases: one human-readable name per address, unique per chain.

use std::sync::Arc;

use strata_store::{decode_record, Keyspace, KvStore, KvStoreExt};
use strata_types::Address;

use crate::error::LedgerError;

#[derive(Clone)]
pub struct AliasStore {
    store: Arc<dyn KvStore>,
}

impl AliasStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn address_of(&self, alias: &str) -> Result<Option<Address>, LedgerError> {
        Ok(self.store.get_record(Keyspace::Aliases, alias.as_bytes())?)
    }

    pub fn alias_of(&self, address: &Address) -> Result<Option<String>, LedgerError> {
        Ok(self
            .store
            .get_record(Keyspace::AliasOwners, &address.to_bytes())?)
    }

    pub fn set_alias(&self, address: &Address, alias: &str) -> Result<(), LedgerError> {
        if self.address_of(alias)?.is_some() {
            return Err(LedgerError::AliasTaken(alias.to_string()));
        }
        if self.alias_of(address)?.is_some() {
            return Err(LedgerError::AddressHasAlias(*address));
        }
        self.store
            .put_record(Keyspace::Aliases, alias.as_bytes(), address)?;
        if let Err(e) = self
            .store
            .put_record(Keyspace::AliasOwners, &address.to_bytes(), &alias.to_string())
        {
            if let Err(undo) = self.store.delete(Keyspace::Aliases, alias.as_bytes()) {
                tracing::error!(alias, error = %undo, "failed to undo partial alias write");
                return Err(LedgerError::CorruptChain(format!(
                    "alias '{alias}' left half-written: {undo}"
                )));
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Every binding as `(alias, address)`, in alias order.
    pub fn all(&self) -> Result<Vec<(String, Address)>, LedgerError> {
        self.store
            .scan_prefix(Keyspace::Aliases, &[])?
            .into_iter()
            .map(|(key, value)| {
                let alias = String::from_utf8(key).map_err(|e| {
                    LedgerError::CorruptChain(format!("alias key is not utf-8: {e}"))
                })?;
                Ok((alias, decode_record(&value)?))
            })
            .collect()
    }

    /// Remove `alias` from `address`. Missing bindings are a no-op so that
    /// repeated rollbacks stay safe.
    pub fn remove_alias(&self, address: &Address, alias: &str) -> Result<(), LedgerError> {
        if self.alias_of(address)?.as_deref() == Some(alias) {
            self.store.delete(Keyspace::AliasOwners, &address.to_bytes())?;
        }
        if self.address_of(alias)?.as_ref() == Some(address) {
            self.store.delete(Keyspace::Aliases, alias.as_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nullables::NullStore;
    use strata_types::ChainId;

    fn addr(b: u8) -> Address {
        Address::new(ChainId::new(1), [b; 20])
    }

    #[test]
    fn alias_binds_both_ways() {
        let aliases = AliasStore::new(Arc::new(NullStore::new()));
        aliases.set_alias(&addr(1), "alice").unwrap();
        assert_eq!(aliases.address_of("alice").unwrap(), Some(addr(1)));
        assert_eq!(aliases.alias_of(&addr(1)).unwrap().as_deref(), Some("alice"));

        aliases.set_alias(&addr(2), "bob").unwrap();
        assert_eq!(
            aliases.all().unwrap(),
            vec![("alice".to_string(), addr(1)), ("bob".to_string(), addr(2))]
        );
    }

    #[test]
    fn alias_and_address_are_unique() {
        let aliases = AliasStore::new(Arc::new(NullStore::new()));
        aliases.set_alias(&addr(1), "alice").unwrap();
        assert!(matches!(
            aliases.set_alias(&addr(2), "alice"),
            Err(LedgerError::AliasTaken(_))
        ));
        assert!(matches!(
            aliases.set_alias(&addr(1), "other"),
            Err(LedgerError::AddressHasAlias(_))
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = Arc::new(NullStore::new());
        let aliases = AliasStore::new(store.clone());
        let before = store.snapshot();
        aliases.set_alias(&addr(1), "alice").unwrap();
        aliases.remove_alias(&addr(1), "alice").unwrap();
        aliases.remove_alias(&addr(1), "alice").unwrap();
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn half_write_is_undone() {
        let store = Arc::new(NullStore::new());
        let aliases = AliasStore::new(store.clone());
        store.fail_writes_to(Keyspace::AliasOwners);
        assert!(aliases.set_alias(&addr(1), "alice").is_err());
        assert_eq!(aliases.address_of("alice").unwrap(), None);
    }
}
