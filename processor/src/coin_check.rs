//! In-block simulation of every transaction's debits.
//!
//! Per-type validation sees only committed state, so two spends of the
//! same tip proposed for one block would each look valid alone. This pass
//! replays the debits of the whole block in commit order against a scratch
//! view of every touched nonce chain and rejects the ones that would fail
//! at commit time.

use std::collections::{HashMap, HashSet};

use strata_ledger::LedgerError;
use strata_transactions::{validation, Transaction};
use strata_types::{Address, Amount, AssetKey, Nonce, TxHash};

use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::{ProcessorError, Rejection};

/// Simulated state of one (account, asset) chain.
#[derive(Clone, Debug)]
struct ChainView {
    tip: Nonce,
    /// Committed balance minus in-block debits. In-block credits are not
    /// spendable until the block is final.
    spendable: Amount,
    /// Tips already spent from within this block.
    consumed: HashSet<Nonce>,
    /// Nonces produced within this block.
    produced: HashSet<Nonce>,
}

#[derive(Default)]
pub struct CoinDataChecker {
    views: HashMap<(Address, AssetKey), ChainView>,
}

impl CoinDataChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejections for the transactions of `block` not listed in `skip`.
    pub fn check(
        mut self,
        chain: &ChainContext,
        block: &BlockTxs,
        skip: &HashSet<TxHash>,
    ) -> Vec<Rejection> {
        let mut rejections = Vec::new();
        for tx in block.iter_commit_order() {
            if skip.contains(tx.hash()) {
                continue;
            }
            if let Err(e) = self.spend(chain, tx) {
                tracing::debug!(
                    tx = %tx.hash(),
                    code = %e.code(),
                    error = %e,
                    "coin data rejected"
                );
                rejections.push(Rejection::from_error(*tx.hash(), tx.tx_type(), &e));
            }
        }
        rejections
    }

    /// Check every debit of `tx`; record them only if all pass.
    pub fn spend(&mut self, chain: &ChainContext, tx: &Transaction) -> Result<(), ProcessorError> {
        validation::validate_structure(tx)?;
        let nonce = tx.nonce();
        let mut staged = Vec::with_capacity(tx.coin_data().from.len());

        for input in &tx.coin_data().from {
            let key = (input.address, input.asset);
            let mut view = match self.views.get(&key) {
                Some(view) => view.clone(),
                None => self.load(chain, &input.address, &input.asset)?,
            };

            if view.produced.contains(&nonce)
                || chain.ledger().nonce_exists(&input.address, &input.asset, &nonce)?
            {
                return Err(LedgerError::DuplicateNonce {
                    account: input.address,
                    asset: input.asset,
                    nonce,
                }
                .into());
            }
            if input.nonce != view.tip {
                if view.consumed.contains(&input.nonce) {
                    // Another transaction of this block already spent from it.
                    return Err(LedgerError::DuplicateNonce {
                        account: input.address,
                        asset: input.asset,
                        nonce: input.nonce,
                    }
                    .into());
                }
                return Err(LedgerError::NonceMismatch {
                    account: input.address,
                    asset: input.asset,
                    expected: view.tip,
                    found: input.nonce,
                }
                .into());
            }
            if view.spendable < input.amount {
                return Err(ProcessorError::InsufficientBalance {
                    account: input.address,
                    asset: input.asset,
                    available: view.spendable,
                    required: input.amount.clone(),
                });
            }

            view.consumed.insert(view.tip);
            view.produced.insert(nonce);
            view.tip = nonce;
            view.spendable -= &input.amount;
            staged.push((key, view));
        }

        self.views.extend(staged);
        Ok(())
    }

    fn load(
        &self,
        chain: &ChainContext,
        account: &Address,
        asset: &AssetKey,
    ) -> Result<ChainView, ProcessorError> {
        let state = chain.ledger().account_state(account, asset)?;
        Ok(ChainView {
            tip: state.tip,
            spendable: state.balance(),
            consumed: HashSet::new(),
            produced: HashSet::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_nullables::NullStore;
    use strata_transactions::{CoinData, CoinFrom, CoinTo, TxPayload};
    use strata_types::{ChainConfig, ChainId, ErrorCode, Timestamp};

    fn asset() -> AssetKey {
        AssetKey::new(ChainId::new(1), 1)
    }

    fn addr(b: u8) -> Address {
        Address::new(ChainId::new(1), [b; 20])
    }

    fn chain_with(balance: u32) -> ChainContext {
        let config = ChainConfig::new(ChainId::new(1));
        let chain = ChainContext::new(config, Arc::new(NullStore::new()));
        chain.ledger().credit(&addr(1), &asset(), &Amount::from(balance)).unwrap();
        chain
    }

    fn spend(from: Nonce, amount: u32, time: u64) -> Transaction {
        let coin = CoinData::new(
            vec![CoinFrom {
                address: addr(1),
                asset: asset(),
                amount: Amount::from(amount),
                nonce: from,
            }],
            vec![CoinTo { address: addr(2), asset: asset(), amount: Amount::from(amount) }],
        );
        Transaction::from_payload(ChainId::new(1), Timestamp::new(time), &TxPayload::Transfer, coin)
    }

    fn codes(chain: &ChainContext, txs: Vec<Transaction>) -> Vec<(TxHash, ErrorCode)> {
        CoinDataChecker::new()
            .check(chain, &BlockTxs::new(txs), &HashSet::new())
            .into_iter()
            .map(|r| (r.tx_hash, r.code))
            .collect()
    }

    #[test]
    fn second_spend_of_same_tip_is_duplicate() {
        let chain = chain_with(100);
        let a = spend(Nonce::GENESIS, 10, 1);
        let b = spend(Nonce::GENESIS, 20, 2);
        assert_eq!(codes(&chain, vec![a, b.clone()]), vec![(*b.hash(), ErrorCode::DuplicateNonce)]);
    }

    #[test]
    fn chained_spends_in_one_block_pass() {
        let chain = chain_with(100);
        let a = spend(Nonce::GENESIS, 10, 1);
        let b = spend(a.nonce(), 20, 2);
        assert!(codes(&chain, vec![a, b]).is_empty());
    }

    #[test]
    fn stale_nonce_and_overspend() {
        let chain = chain_with(100);
        let stale = spend(Nonce::new([9; 8]), 10, 1);
        let a = spend(Nonce::GENESIS, 80, 2);
        let over = spend(a.nonce(), 30, 3);
        assert_eq!(
            codes(&chain, vec![stale.clone(), a, over.clone()]),
            vec![
                (*stale.hash(), ErrorCode::NonceMismatch),
                (*over.hash(), ErrorCode::InsufficientBalance),
            ]
        );
    }

    #[test]
    fn skipped_transactions_do_not_spend() {
        let chain = chain_with(100);
        let a = spend(Nonce::GENESIS, 10, 1);
        let b = spend(Nonce::GENESIS, 20, 2);
        let skip: HashSet<TxHash> = [*a.hash()].into_iter().collect();
        let rejections = CoinDataChecker::new().check(&chain, &BlockTxs::new(vec![a, b]), &skip);
        assert!(rejections.is_empty());
    }

    #[test]
    fn failed_spend_records_no_debit() {
        let chain = chain_with(100);
        // The second input overdraws, so the first must not be recorded either.
        let input = |address| CoinFrom {
            address,
            asset: asset(),
            amount: Amount::from(10u32),
            nonce: Nonce::GENESIS,
        };
        let coin = CoinData::new(vec![input(addr(1)), input(addr(2))], vec![]);
        let time = Timestamp::new(1);
        let both = Transaction::from_payload(ChainId::new(1), time, &TxPayload::Transfer, coin);
        let mut checker = CoinDataChecker::new();
        assert!(checker.spend(&chain, &both).is_err());
        checker.spend(&chain, &spend(Nonce::GENESIS, 10, 2)).unwrap();
    }
}
