//! The nonce-chain ledger.
//!
//! Owns balance-entry persistence. Every (account, asset) pair has a state
//! record holding the chain tip, and each debit is one entry keyed by the
//! nonce it occupies. The store offers no transactions, so each mutating
//! call undoes its own earlier writes when a later write fails.

use std::sync::Arc;

use strata_store::{decode_record, Keyspace, KvStore, KvStoreExt};
use strata_types::{Address, Amount, AssetKey, Nonce};

use crate::account_chain::AccountChain;
use crate::entry::{
    account_key, entry_key, parse_account_key, AccountState, BalanceEntry, ACCOUNT_KEY_LEN,
};
use crate::error::LedgerError;

#[derive(Clone)]
pub struct NonceChainLedger {
    store: Arc<dyn KvStore>,
}

impl NonceChainLedger {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn account_state(
        &self,
        account: &Address,
        asset: &AssetKey,
    ) -> Result<AccountState, LedgerError> {
        Ok(self
            .store
            .get_record(Keyspace::LedgerAccounts, &account_key(account, asset))?
            .unwrap_or_default())
    }

    /// Nonce of the chain tip, or genesis for an empty chain.
    pub fn tip(&self, account: &Address, asset: &AssetKey) -> Result<Nonce, LedgerError> {
        Ok(self.account_state(account, asset)?.tip)
    }

    pub fn entry(
        &self,
        account: &Address,
        asset: &AssetKey,
        nonce: &Nonce,
    ) -> Result<Option<BalanceEntry>, LedgerError> {
        Ok(self
            .store
            .get_record(Keyspace::LedgerEntries, &entry_key(account, asset, nonce))?)
    }

    pub fn nonce_exists(
        &self,
        account: &Address,
        asset: &AssetKey,
        nonce: &Nonce,
    ) -> Result<bool, LedgerError> {
        Ok(nonce.is_genesis()
            || self
                .store
                .exists(Keyspace::LedgerEntries, &entry_key(account, asset, nonce))?)
    }

    /// Credited total plus every committed chain delta.
    pub fn current_balance(
        &self,
        account: &Address,
        asset: &AssetKey,
    ) -> Result<Amount, LedgerError> {
        Ok(self.account_state(account, asset)?.balance())
    }

    /// Entries from genesis to tip, with every link checked.
    pub fn chain(
        &self,
        account: &Address,
        asset: &AssetKey,
    ) -> Result<Vec<BalanceEntry>, LedgerError> {
        let state = self.account_state(account, asset)?;
        let raw = self
            .store
            .scan_prefix(Keyspace::LedgerEntries, &account_key(account, asset))?;
        let mut entries = Vec::with_capacity(raw.len());
        for (_, bytes) in raw {
            entries.push(decode_record(&bytes)?);
        }
        AccountChain::new(*account, *asset, &state).walk(entries)
    }

    /// Every (account, asset) pair with a state record, in key order.
    pub fn accounts(&self) -> Result<Vec<(Address, AssetKey, AccountState)>, LedgerError> {
        let mut out = Vec::new();
        for (key, bytes) in self.store.scan_prefix(Keyspace::LedgerAccounts, &[])? {
            let (account, asset) = parse_account_key(&key).ok_or_else(|| {
                LedgerError::CorruptChain(format!(
                    "account key of {} bytes, expected {ACCOUNT_KEY_LEN}",
                    key.len()
                ))
            })?;
            let state = decode_record(&bytes)?;
            out.push((account, asset, state));
        }
        Ok(out)
    }

    /// Link a new entry as the chain tip.
    ///
    /// Fails with `NonceMismatch` if `from_nonce` is not the current tip and
    /// with `DuplicateNonce` if `new_nonce` is already on this chain (the
    /// genesis sentinel counts as taken).
    pub fn append_entry(
        &self,
        account: &Address,
        asset: &AssetKey,
        from_nonce: &Nonce,
        new_nonce: &Nonce,
        delta: Amount,
    ) -> Result<BalanceEntry, LedgerError> {
        let state = self.account_state(account, asset)?;
        AccountChain::new(*account, *asset, &state).validate_append(from_nonce)?;
        if self.nonce_exists(account, asset, new_nonce)? {
            return Err(LedgerError::DuplicateNonce {
                account: *account,
                asset: *asset,
                nonce: *new_nonce,
            });
        }

        let previous = if state.length > 0 {
            Some(self.expect_entry(account, asset, &state.tip)?)
        } else {
            None
        };

        let entry = BalanceEntry {
            account: *account,
            asset: *asset,
            from_nonce: *from_nonce,
            nonce: *new_nonce,
            next_nonce: None,
            delta,
        };
        let mut next_state = state.clone();
        next_state.tip = *new_nonce;
        next_state.length += 1;
        next_state.chain_sum += &entry.delta;

        let new_key = entry_key(account, asset, new_nonce);
        self.store
            .put_record(Keyspace::LedgerEntries, &new_key, &entry)?;

        if let Some(prev) = &previous {
            let mut linked = prev.clone();
            linked.next_nonce = Some(*new_nonce);
            if let Err(e) = self.put_entry(&linked) {
                self.undo(self.store.delete(Keyspace::LedgerEntries, &new_key).map(drop))?;
                return Err(e);
            }
        }

        if let Err(e) = self.put_state(account, asset, &next_state) {
            if let Some(prev) = &previous {
                self.undo(self.put_entry(prev))?;
            }
            self.undo(self.store.delete(Keyspace::LedgerEntries, &new_key).map(drop))?;
            return Err(e);
        }

        tracing::trace!(
            %account,
            %asset,
            nonce = %new_nonce,
            delta = %entry.delta,
            "appended entry"
        );
        Ok(entry)
    }

    /// Remove the tip entry and make its predecessor the tip again.
    pub fn retract_tip(
        &self,
        account: &Address,
        asset: &AssetKey,
    ) -> Result<BalanceEntry, LedgerError> {
        let state = self.account_state(account, asset)?;
        if state.length == 0 {
            return Err(LedgerError::EmptyChain {
                account: *account,
                asset: *asset,
            });
        }
        let tip = self.expect_entry(account, asset, &state.tip)?;

        let previous = if state.length > 1 {
            Some(self.expect_entry(account, asset, &tip.from_nonce)?)
        } else {
            None
        };

        let mut prev_state = state.clone();
        prev_state.tip = tip.from_nonce;
        prev_state.length -= 1;
        prev_state.chain_sum -= &tip.delta;

        if let Some(prev) = &previous {
            let mut unlinked = prev.clone();
            unlinked.next_nonce = None;
            self.put_entry(&unlinked)?;
        }

        let tip_key = entry_key(account, asset, &tip.nonce);
        if let Err(e) = self.store.delete(Keyspace::LedgerEntries, &tip_key) {
            if let Some(prev) = &previous {
                self.undo(self.put_entry(prev))?;
            }
            return Err(e.into());
        }

        if let Err(e) = self.put_state(account, asset, &prev_state) {
            self.undo(self.put_entry(&tip))?;
            if let Some(prev) = &previous {
                self.undo(self.put_entry(prev))?;
            }
            return Err(e);
        }

        tracing::trace!(%account, %asset, nonce = %tip.nonce, "retracted tip");
        Ok(tip)
    }

    /// Add an incoming amount. Credits do not touch the nonce chain.
    pub fn credit(
        &self,
        account: &Address,
        asset: &AssetKey,
        amount: &Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.account_state(account, asset)?;
        state.credited += amount;
        self.put_state(account, asset, &state)
    }

    /// Inverse of [`NonceChainLedger::credit`].
    pub fn revert_credit(
        &self,
        account: &Address,
        asset: &AssetKey,
        amount: &Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.account_state(account, asset)?;
        state.credited -= amount;
        self.put_state(account, asset, &state)
    }

    fn expect_entry(
        &self,
        account: &Address,
        asset: &AssetKey,
        nonce: &Nonce,
    ) -> Result<BalanceEntry, LedgerError> {
        self.entry(account, asset, nonce)?.ok_or_else(|| {
            LedgerError::CorruptChain(format!("{account} / {asset}: entry {nonce} is missing"))
        })
    }

    fn put_entry(&self, entry: &BalanceEntry) -> Result<(), LedgerError> {
        let key = entry_key(&entry.account, &entry.asset, &entry.nonce);
        Ok(self.store.put_record(Keyspace::LedgerEntries, &key, entry)?)
    }

    /// Persist a state record; empty states are deleted so that a fully
    /// reverted account leaves no trace.
    fn put_state(
        &self,
        account: &Address,
        asset: &AssetKey,
        state: &AccountState,
    ) -> Result<(), LedgerError> {
        let key = account_key(account, asset);
        if state.is_empty() {
            self.store.delete(Keyspace::LedgerAccounts, &key)?;
        } else {
            self.store.put_record(Keyspace::LedgerAccounts, &key, state)?;
        }
        Ok(())
    }

    /// A failed undo of a partial write leaves the chain inconsistent.
    fn undo<E: std::fmt::Display>(&self, result: Result<(), E>) -> Result<(), LedgerError> {
        result.map_err(|e| {
            tracing::error!(error = %e, "failed to undo partial ledger write");
            LedgerError::CorruptChain(format!("undo of partial write failed: {e}"))
        })
    }
}
