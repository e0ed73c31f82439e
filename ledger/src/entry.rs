//! Stored records of the nonce-chain ledger and their keys.

use serde::{Deserialize, Serialize};
use strata_types::{Address, Amount, AssetKey, Nonce};

/// Key of one (account, asset) pair: `address ++ asset`.
pub const ACCOUNT_KEY_LEN: usize = Address::LEN + AssetKey::LEN;
/// Key of one balance entry: `address ++ asset ++ nonce`.
pub const ENTRY_KEY_LEN: usize = ACCOUNT_KEY_LEN + Nonce::LEN;

pub fn account_key(account: &Address, asset: &AssetKey) -> [u8; ACCOUNT_KEY_LEN] {
    let mut key = [0u8; ACCOUNT_KEY_LEN];
    key[..Address::LEN].copy_from_slice(&account.to_bytes());
    key[Address::LEN..].copy_from_slice(&asset.to_key_bytes());
    key
}

pub fn entry_key(account: &Address, asset: &AssetKey, nonce: &Nonce) -> [u8; ENTRY_KEY_LEN] {
    let mut key = [0u8; ENTRY_KEY_LEN];
    key[..ACCOUNT_KEY_LEN].copy_from_slice(&account_key(account, asset));
    key[ACCOUNT_KEY_LEN..].copy_from_slice(nonce.as_bytes());
    key
}

/// Inverse of [`account_key`]; `None` for keys of the wrong shape.
pub fn parse_account_key(key: &[u8]) -> Option<(Address, AssetKey)> {
    if key.len() != ACCOUNT_KEY_LEN {
        return None;
    }
    let address = Address::from_bytes(&key[..Address::LEN]).ok()?;
    let chain = u16::from_be_bytes([key[Address::LEN], key[Address::LEN + 1]]);
    let asset_id = u16::from_be_bytes([key[Address::LEN + 2], key[Address::LEN + 3]]);
    Some((address, AssetKey::new(chain.into(), asset_id)))
}

/// One link of an account's nonce chain for one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: Address,
    pub asset: AssetKey,
    /// Nonce this entry consumes: the previous entry's `nonce`, or genesis.
    pub from_nonce: Nonce,
    /// Nonce this entry occupies.
    pub nonce: Nonce,
    /// Nonce of the following entry. `None` only on the tip.
    pub next_nonce: Option<Nonce>,
    pub delta: Amount,
}

impl BalanceEntry {
    pub fn is_tip(&self) -> bool {
        self.next_nonce.is_none()
    }
}

/// Summary of one (account, asset) pair.
///
/// `balance = credited + chain_sum`. Credits do not form chain entries, so
/// receiving funds never moves the tip a sender has declared against.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub tip: Nonce,
    pub length: u64,
    pub chain_sum: Amount,
    pub credited: Amount,
}

impl AccountState {
    pub fn balance(&self) -> Amount {
        &self.credited + &self.chain_sum
    }

    /// No entries and nothing credited: the record can be dropped.
    pub fn is_empty(&self) -> bool {
        self.length == 0 && self.credited.is_zero() && self.chain_sum.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::ChainId;

    #[test]
    fn entry_keys_group_by_account_then_asset() {
        let a = Address::new(ChainId::new(1), [1; 20]);
        let asset = AssetKey::new(ChainId::new(1), 1);
        let key = entry_key(&a, &asset, &Nonce::new([9; 8]));
        assert!(key.starts_with(&account_key(&a, &asset)));
        assert_eq!(parse_account_key(&key[..ACCOUNT_KEY_LEN]), Some((a, asset)));
        assert_eq!(parse_account_key(&key), None);
    }

    #[test]
    fn balance_adds_credits_to_chain() {
        let state = AccountState {
            tip: Nonce::new([1; 8]),
            length: 2,
            chain_sum: Amount::from(-30i32),
            credited: Amount::from(100u32),
        };
        assert_eq!(state.balance(), Amount::from(70u32));
        assert!(!state.is_empty());
        assert!(AccountState::default().is_empty());
    }
}
