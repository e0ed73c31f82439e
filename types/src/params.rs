//! Per-chain configuration: deposit bounds, minimum deposit changes,
//! commission limits, and alias fees.
//!
//! Loaded once at node startup (see `strata-node::config`) and read-only
//! afterwards.

use crate::address::Address;
use crate::amount::Amount;
use crate::asset::{AssetKey, ChainId};
use serde::{Deserialize, Serialize};

/// Inclusive bounds on an agent's total deposit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositBounds {
    pub min: Amount,
    pub max: Amount,
}

impl DepositBounds {
    pub fn new(min: Amount, max: Amount) -> Self {
        Self { min, max }
    }

    /// Whether `total` lies within `[min, max]`.
    pub fn contains(&self, total: &Amount) -> bool {
        *total >= self.min && *total <= self.max
    }
}

impl Default for DepositBounds {
    fn default() -> Self {
        Self {
            min: Amount::from(20_000u64),
            max: Amount::from(700_000u64),
        }
    }
}

/// Initial balance credited when a chain's ledger is first bootstrapped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub address: Address,
    /// Defaults to the chain's staking asset.
    #[serde(default)]
    pub asset: Option<AssetKey>,
    pub amount: Amount,
}

/// Configuration of one chain served by this node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,

    /// Human-readable chain name (logs only).
    #[serde(default = "default_name")]
    pub name: String,

    /// Bounds every agent's total deposit must stay within.
    #[serde(default)]
    pub deposit: DepositBounds,

    /// Smallest amount a single deposit-append may add.
    #[serde(default = "default_change_min")]
    pub append_min: Amount,

    /// Smallest amount a single deposit-reduce may withdraw.
    #[serde(default = "default_change_min")]
    pub reduce_min: Amount,

    /// Allowed commission rate range (percent) at registration.
    #[serde(default = "default_commission_min")]
    pub commission_min: u8,
    #[serde(default = "default_commission_max")]
    pub commission_max: u8,

    /// Asset used for fees and deposits; defaults to asset 1 of this chain.
    #[serde(default)]
    pub fee_asset: Option<AssetKey>,

    /// Fee burned when setting an alias.
    #[serde(default = "default_alias_fee")]
    pub alias_fee: Amount,

    /// Balances credited once, the first time the chain is opened.
    #[serde(default)]
    pub genesis: Vec<GenesisAllocation>,
}

fn default_name() -> String {
    "strata".to_string()
}

fn default_change_min() -> Amount {
    Amount::from(2_000u64)
}

fn default_commission_min() -> u8 {
    10
}

fn default_commission_max() -> u8 {
    100
}

fn default_alias_fee() -> Amount {
    Amount::from(1u64)
}

impl ChainConfig {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            name: default_name(),
            deposit: DepositBounds::default(),
            append_min: default_change_min(),
            reduce_min: default_change_min(),
            commission_min: default_commission_min(),
            commission_max: default_commission_max(),
            fee_asset: None,
            alias_fee: default_alias_fee(),
            genesis: Vec::new(),
        }
    }

    /// The asset deposits and fees are paid in.
    pub fn staking_asset(&self) -> AssetKey {
        self.fee_asset.unwrap_or(AssetKey::new(self.chain_id, 1))
    }

    /// Check internal consistency; returns a description of the first problem.
    pub fn check(&self) -> Result<(), String> {
        if self.deposit.min.is_negative() || self.deposit.min > self.deposit.max {
            return Err(format!(
                "chain {}: deposit bounds [{}, {}] are inverted or negative",
                self.chain_id, self.deposit.min, self.deposit.max
            ));
        }
        if !self.append_min.is_positive() || !self.reduce_min.is_positive() {
            return Err(format!(
                "chain {}: append_min and reduce_min must be positive",
                self.chain_id
            ));
        }
        if self.commission_min > self.commission_max || self.commission_max > 100 {
            return Err(format!(
                "chain {}: commission range {}..={} is invalid",
                self.chain_id, self.commission_min, self.commission_max
            ));
        }
        for alloc in &self.genesis {
            if !alloc.amount.is_positive() {
                return Err(format!(
                    "chain {}: genesis allocation to {} must be positive",
                    self.chain_id, alloc.address
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let bounds = DepositBounds::new(Amount::from(1000u32), Amount::from(5000u32));
        assert!(bounds.contains(&Amount::from(1000u32)));
        assert!(bounds.contains(&Amount::from(5000u32)));
        assert!(!bounds.contains(&Amount::from(5001u32)));
        assert!(!bounds.contains(&Amount::from(999u32)));
    }

    #[test]
    fn default_config_is_consistent() {
        let config = ChainConfig::new(ChainId::new(1));
        assert!(config.check().is_ok());
        assert_eq!(config.staking_asset(), AssetKey::new(ChainId::new(1), 1));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let mut config = ChainConfig::new(ChainId::new(1));
        config.deposit = DepositBounds::new(Amount::from(10u32), Amount::from(5u32));
        assert!(config.check().is_err());
    }
}
