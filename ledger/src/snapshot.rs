//! Ledger snapshots: every account state plus a digest of all of them.
//!
//! Nodes that applied the same blocks must produce the same digest, which
//! makes the snapshot a cheap determinism check between nodes or backends.

use serde::{Deserialize, Serialize};

use strata_types::{Address, Amount, AssetKey, Nonce};

use crate::error::LedgerError;
use crate::ledger::NonceChainLedger;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub address: Address,
    pub asset: AssetKey,
    pub tip: Nonce,
    pub chain_length: u64,
    pub balance: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 over the accounts in key order, hex encoded.
    pub digest: String,
    pub accounts: Vec<AccountSnapshot>,
}

impl LedgerSnapshot {
    pub fn capture(ledger: &NonceChainLedger) -> Result<Self, LedgerError> {
        let accounts = ledger
            .accounts()?
            .into_iter()
            .map(|(address, asset, state)| AccountSnapshot {
                address,
                asset,
                tip: state.tip,
                chain_length: state.length,
                balance: state.balance(),
            })
            .collect::<Vec<_>>();
        let digest = compute_digest(&accounts);
        Ok(Self { digest, accounts })
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

fn compute_digest(accounts: &[AccountSnapshot]) -> String {
    use blake2::digest::consts::U32;
    use blake2::{Blake2b, Digest};

    let mut hasher = Blake2b::<U32>::new();
    for account in accounts {
        hasher.update(account.address.to_bytes());
        hasher.update(account.asset.to_key_bytes());
        hasher.update(account.tip.as_bytes());
        hasher.update(account.chain_length.to_le_bytes());
        let balance = account.balance.to_signed_bytes_le();
        hasher.update((balance.len() as u32).to_le_bytes());
        hasher.update(&balance);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_nullables::NullStore;
    use strata_types::ChainId;

    fn ledger_with(credits: &[(u8, u32)]) -> NonceChainLedger {
        let ledger = NonceChainLedger::new(Arc::new(NullStore::new()));
        let asset = AssetKey::new(ChainId::new(1), 1);
        for (seed, amount) in credits {
            let addr = Address::new(ChainId::new(1), [*seed; 20]);
            ledger.credit(&addr, &asset, &Amount::from(*amount)).unwrap();
        }
        ledger
    }

    #[test]
    fn same_state_same_digest() {
        let a = LedgerSnapshot::capture(&ledger_with(&[(1, 10), (2, 20)])).unwrap();
        // Insertion order does not matter.
        let b = LedgerSnapshot::capture(&ledger_with(&[(2, 20), (1, 10)])).unwrap();
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.account_count(), 2);
    }

    #[test]
    fn different_balance_different_digest() {
        let a = LedgerSnapshot::capture(&ledger_with(&[(1, 10)])).unwrap();
        let b = LedgerSnapshot::capture(&ledger_with(&[(1, 11)])).unwrap();
        assert_ne!(a.digest, b.digest);
    }
}
