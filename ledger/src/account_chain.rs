//! Per-(account, asset) chain view and link checks.

use std::collections::HashMap;

use crate::entry::{AccountState, BalanceEntry};
use crate::error::LedgerError;
use strata_types::{Address, AssetKey, Nonce};

/// The chain of one account for one asset, as described by its state record.
pub struct AccountChain {
    pub account: Address,
    pub asset: AssetKey,
    /// Nonce of the tip entry, or genesis for an empty chain.
    pub tip: Nonce,
    pub length: u64,
}

impl AccountChain {
    pub fn new(account: Address, asset: AssetKey, state: &AccountState) -> Self {
        Self {
            account,
            asset,
            tip: state.tip,
            length: state.length,
        }
    }

    /// Check that a spend declaring `from_nonce` builds on the current tip.
    pub fn validate_append(&self, from_nonce: &Nonce) -> Result<(), LedgerError> {
        if *from_nonce != self.tip {
            return Err(LedgerError::NonceMismatch {
                account: self.account,
                asset: self.asset,
                expected: self.tip,
                found: *from_nonce,
            });
        }
        Ok(())
    }

    /// Order stored entries from genesis to tip, checking every link.
    ///
    /// Entries come back from the store in key (nonce) order; this follows
    /// the `from_nonce -> nonce` links instead and fails on gaps, forks,
    /// repeated nonces or a tip that disagrees with the state record.
    pub fn walk(&self, entries: Vec<BalanceEntry>) -> Result<Vec<BalanceEntry>, LedgerError> {
        let total = entries.len();
        let mut by_from: HashMap<Nonce, BalanceEntry> = HashMap::with_capacity(total);
        for entry in entries {
            let from = entry.from_nonce;
            if by_from.insert(from, entry).is_some() {
                return Err(self.corrupt(format!("two entries consume nonce {from}")));
            }
        }

        let mut ordered = Vec::with_capacity(total);
        let mut cursor = Nonce::GENESIS;
        while let Some(entry) = by_from.remove(&cursor) {
            let expected_next = by_from.get(&entry.nonce).map(|next| next.nonce);
            if entry.next_nonce != expected_next {
                return Err(self.corrupt(format!(
                    "entry {} links forward to {:?}, chain continues with {:?}",
                    entry.nonce, entry.next_nonce, expected_next
                )));
            }
            cursor = entry.nonce;
            ordered.push(entry);
        }

        if !by_from.is_empty() {
            return Err(self.corrupt(format!("{} entries unreachable from genesis", by_from.len())));
        }
        if ordered.len() as u64 != self.length || cursor != self.tip {
            return Err(self.corrupt(format!(
                "walked {} entries to tip {cursor}, state records {} entries to tip {}",
                ordered.len(),
                self.length,
                self.tip
            )));
        }
        Ok(ordered)
    }

    fn corrupt(&self, detail: String) -> LedgerError {
        LedgerError::CorruptChain(format!("{} / {}: {detail}", self.account, self.asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::{Amount, ChainId};

    fn chain(tip: Nonce, length: u64) -> AccountChain {
        AccountChain {
            account: Address::new(ChainId::new(1), [1; 20]),
            asset: AssetKey::new(ChainId::new(1), 1),
            tip,
            length,
        }
    }

    fn entry(from: u8, nonce: u8, next: Option<u8>) -> BalanceEntry {
        BalanceEntry {
            account: Address::new(ChainId::new(1), [1; 20]),
            asset: AssetKey::new(ChainId::new(1), 1),
            from_nonce: if from == 0 { Nonce::GENESIS } else { Nonce::new([from; 8]) },
            nonce: Nonce::new([nonce; 8]),
            next_nonce: next.map(|n| Nonce::new([n; 8])),
            delta: Amount::from(-1i32),
        }
    }

    #[test]
    fn validate_append_requires_tip() {
        let c = chain(Nonce::new([5; 8]), 1);
        assert!(c.validate_append(&Nonce::new([5; 8])).is_ok());
        assert!(matches!(
            c.validate_append(&Nonce::GENESIS),
            Err(LedgerError::NonceMismatch { .. })
        ));
    }

    #[test]
    fn walk_orders_by_links_not_keys() {
        // Key order would be 3, 7, 9; link order is 9 -> 3 -> 7.
        let entries = vec![entry(9, 3, Some(7)), entry(3, 7, None), entry(0, 9, Some(3))];
        let walked = chain(Nonce::new([7; 8]), 3).walk(entries).unwrap();
        let nonces: Vec<_> = walked.iter().map(|e| e.nonce.as_bytes()[0]).collect();
        assert_eq!(nonces, vec![9, 3, 7]);
    }

    #[test]
    fn walk_detects_gap() {
        let entries = vec![entry(0, 9, Some(3)), entry(4, 7, None)];
        assert!(matches!(
            chain(Nonce::new([7; 8]), 2).walk(entries),
            Err(LedgerError::CorruptChain(_))
        ));
    }

    #[test]
    fn walk_detects_stale_forward_link() {
        let entries = vec![entry(0, 9, None), entry(9, 3, None)];
        assert!(chain(Nonce::new([3; 8]), 2).walk(entries).is_err());
    }
}
