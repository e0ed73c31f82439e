//! JSON block fixtures for `strata-daemon apply`.
//!
//! A fixture names the block header and, for every transaction, its
//! payload and coin movements. Input nonces may be omitted: they then
//! default to the account's current tip, or to the nonce produced by an
//! earlier transaction of the same fixture when `after` is given, which
//! is how chained spends inside one block are written.
//!
//! ```json
//! {
//!   "header": { "height": 2, "time": 20, "hash": "02...02" },
//!   "transactions": [
//!     { "time": 2,
//!       "payload": { "type": "append_deposit", "address": "1:0101...",
//!                    "amount": "3000", "agent_id": "ab.." },
//!       "inputs": [ { "address": "1:0101...", "amount": "3000" } ] },
//!     { "time": 3,
//!       "payload": { "type": "append_deposit", "address": "1:0101...",
//!                    "amount": "2500", "agent_id": "ab.." },
//!       "inputs": [ { "address": "1:0101...", "amount": "2500", "after": 0 } ] }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use strata_processor::ChainContext;
use strata_transactions::{CoinData, CoinFrom, CoinTo, Transaction, TxPayload};
use strata_types::{Address, Amount, AssetKey, BlockHeader, Nonce, Timestamp};

#[derive(Debug, Deserialize)]
pub struct BlockFixture {
    pub header: BlockHeader,
    #[serde(default)]
    pub transactions: Vec<TxFixture>,
}

#[derive(Debug, Deserialize)]
pub struct TxFixture {
    pub time: Timestamp,
    pub payload: TxPayload,
    #[serde(default)]
    pub inputs: Vec<InputFixture>,
    #[serde(default)]
    pub outputs: Vec<OutputFixture>,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Deserialize)]
pub struct InputFixture {
    pub address: Address,
    /// Defaults to the chain's staking asset.
    pub asset: Option<AssetKey>,
    pub amount: Amount,
    pub nonce: Option<Nonce>,
    /// Index of an earlier transaction of this fixture whose nonce this
    /// input spends.
    pub after: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OutputFixture {
    pub address: Address,
    pub asset: Option<AssetKey>,
    pub amount: Amount,
}

impl BlockFixture {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading block fixture {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing block fixture {}", path.display()))
    }

    /// Build the block's transactions against the current state of `chain`.
    pub fn build(self, chain: &ChainContext) -> anyhow::Result<(BlockHeader, Vec<Transaction>)> {
        let staking = chain.config().staking_asset();
        let mut built: Vec<Transaction> = Vec::with_capacity(self.transactions.len());

        for (index, fixture) in self.transactions.into_iter().enumerate() {
            let mut from = Vec::with_capacity(fixture.inputs.len());
            for input in fixture.inputs {
                let asset = input.asset.unwrap_or(staking);
                let nonce = match (input.nonce, input.after) {
                    (Some(_), Some(_)) => {
                        bail!("transaction {index}: an input gives both `nonce` and `after`")
                    }
                    (Some(nonce), None) => nonce,
                    (None, Some(earlier)) => match built.get(earlier) {
                        Some(tx) if earlier < index => tx.nonce(),
                        _ => bail!("transaction {index}: `after` must name an earlier transaction"),
                    },
                    (None, None) => chain.ledger().tip(&input.address, &asset)?,
                };
                from.push(CoinFrom {
                    address: input.address,
                    asset,
                    amount: input.amount,
                    nonce,
                });
            }
            let to = fixture
                .outputs
                .into_iter()
                .map(|output| CoinTo {
                    address: output.address,
                    asset: output.asset.unwrap_or(staking),
                    amount: output.amount,
                })
                .collect();

            built.push(Transaction::new(
                fixture.payload.tx_type(),
                chain.chain_id(),
                fixture.time,
                fixture.payload.encode(),
                CoinData::new(from, to),
                fixture.remark.into_bytes(),
            ));
        }
        Ok((self.header, built))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_nullables::NullStore;
    use strata_types::{ChainConfig, ChainId};

    fn chain() -> ChainContext {
        ChainContext::new(ChainConfig::new(ChainId::new(1)), Arc::new(NullStore::new()))
    }

    fn owner() -> String {
        Address::new(ChainId::new(1), [1; 20]).to_string()
    }

    #[test]
    fn after_chains_inputs_inside_the_block() {
        let json = format!(
            r#"{{
                "header": {{ "height": 3, "time": 30, "hash": "{hash}" }},
                "transactions": [
                    {{ "time": 1, "payload": {{ "type": "transfer" }},
                       "inputs": [ {{ "address": "{owner}", "amount": "5" }} ] }},
                    {{ "time": 2, "payload": {{ "type": "transfer" }},
                       "inputs": [ {{ "address": "{owner}", "amount": "5", "after": 0 }} ],
                       "remark": "second" }}
                ]
            }}"#,
            hash = "03".repeat(32),
            owner = owner(),
        );
        let fixture: BlockFixture = serde_json::from_str(&json).unwrap();
        let (header, txs) = fixture.build(&chain()).unwrap();

        assert_eq!(header.height, 3);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].coin_data().from[0].nonce, Nonce::GENESIS);
        assert_eq!(txs[1].coin_data().from[0].nonce, txs[0].nonce());
    }

    #[test]
    fn after_must_point_backwards() {
        let json = format!(
            r#"{{
                "header": {{ "height": 1, "time": 1, "hash": "{hash}" }},
                "transactions": [
                    {{ "time": 1, "payload": {{ "type": "transfer" }},
                       "inputs": [ {{ "address": "{owner}", "amount": "5", "after": 0 }} ] }}
                ]
            }}"#,
            hash = "01".repeat(32),
            owner = owner(),
        );
        let fixture: BlockFixture = serde_json::from_str(&json).unwrap();
        assert!(fixture.build(&chain()).is_err());
    }
}
