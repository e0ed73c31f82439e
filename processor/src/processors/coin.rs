//! Coin-data checks and ledger effects shared by every processor.

use strata_transactions::{CoinData, Transaction};
use strata_types::{Address, Amount, AssetKey, ChainId};

use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::{Compensation, Journal};

/// Inputs minus outputs of `asset`. Positive means the transaction takes
/// that much out of circulation (a locked deposit or a burned fee).
pub(crate) fn net_outflow(coin: &CoinData, asset: &AssetKey) -> Amount {
    let debited: Amount = coin
        .from
        .iter()
        .filter(|i| i.asset == *asset)
        .map(|i| &i.amount)
        .sum();
    let credited: Amount = coin
        .to
        .iter()
        .filter(|o| o.asset == *asset)
        .map(|o| &o.amount)
        .sum();
    &debited - &credited
}

/// Outputs may not exceed inputs for any asset, except that `release`
/// may add up to the given amount of one asset (an unlocked deposit).
pub(crate) fn check_no_minting(
    tx: &Transaction,
    release: Option<(&AssetKey, &Amount)>,
) -> Result<(), ProcessorError> {
    let coin = tx.coin_data();
    let mut assets: Vec<AssetKey> = coin.to.iter().map(|o| o.asset).collect();
    assets.sort();
    assets.dedup();
    for asset in assets {
        let mut outflow = net_outflow(coin, &asset);
        if let Some((released, amount)) = release {
            if *released == asset {
                outflow += amount;
            }
        }
        if outflow.is_negative() {
            return Err(ProcessorError::Parameter(format!(
                "outputs of {asset} exceed inputs by {}",
                outflow.abs()
            )));
        }
    }
    Ok(())
}

/// Outputs of `asset` beyond what the inputs fund, the released part of a
/// deposit, may only be paid to `recipient`.
pub(crate) fn check_release_to(
    tx: &Transaction,
    asset: &AssetKey,
    recipient: &Address,
) -> Result<(), ProcessorError> {
    let coin = tx.coin_data();
    let debited: Amount = coin
        .from
        .iter()
        .filter(|i| i.asset == *asset)
        .map(|i| &i.amount)
        .sum();
    let to_others: Amount = coin
        .to
        .iter()
        .filter(|o| o.asset == *asset && o.address != *recipient)
        .map(|o| &o.amount)
        .sum();
    if to_others > debited {
        return Err(ProcessorError::Parameter(format!(
            "released {asset} may only be paid to {recipient}"
        )));
    }
    Ok(())
}

/// Every input address and every output address must be on the local
/// chain, except outputs on `foreign` when it is given.
pub(crate) fn check_addresses(
    chain: &ChainContext,
    tx: &Transaction,
    foreign: Option<ChainId>,
) -> Result<(), ProcessorError> {
    let local = chain.chain_id();
    let coin = tx.coin_data();
    if let Some(input) = coin.from.iter().find(|i| i.address.chain_id() != local) {
        return Err(ProcessorError::Parameter(format!(
            "input address {} is not on chain {local}",
            input.address
        )));
    }
    let allowed = |c: ChainId| c == local || Some(c) == foreign;
    if let Some(output) = coin.to.iter().find(|o| !allowed(o.address.chain_id())) {
        return Err(ProcessorError::Parameter(format!(
            "output address {} is not on chain {local}",
            output.address
        )));
    }
    Ok(())
}

/// The transaction must debit `address` in `asset`.
pub(crate) fn require_input_from(
    tx: &Transaction,
    address: &Address,
    asset: &AssetKey,
) -> Result<(), ProcessorError> {
    if tx
        .coin_data()
        .from
        .iter()
        .any(|i| i.address == *address && i.asset == *asset)
    {
        Ok(())
    } else {
        Err(ProcessorError::Parameter(format!(
            "transaction does not spend {asset} from {address}"
        )))
    }
}

/// Debit every input onto its nonce chain and credit every local output.
pub(crate) fn apply_coin_data(
    chain: &ChainContext,
    tx: &Transaction,
    journal: &mut Journal,
) -> Result<(), ProcessorError> {
    let nonce = tx.nonce();
    for input in &tx.coin_data().from {
        journal.perform(
            chain,
            Compensation::AppendEntry {
                account: input.address,
                asset: input.asset,
                from_nonce: input.nonce,
                nonce,
                delta: -&input.amount,
            },
        )?;
    }
    for output in local_outputs(chain, tx) {
        journal.perform(
            chain,
            Compensation::Credit {
                account: output.address,
                asset: output.asset,
                amount: output.amount.clone(),
            },
        )?;
    }
    Ok(())
}

/// Inverse of [`apply_coin_data`]. Each debited chain must still have this
/// transaction's entry as its tip.
pub(crate) fn revert_coin_data(
    chain: &ChainContext,
    tx: &Transaction,
    journal: &mut Journal,
) -> Result<(), ProcessorError> {
    let outputs: Vec<_> = local_outputs(chain, tx).collect();
    for output in outputs.into_iter().rev() {
        journal.perform(
            chain,
            Compensation::RevertCredit {
                account: output.address,
                asset: output.asset,
                amount: output.amount.clone(),
            },
        )?;
    }
    let nonce = tx.nonce();
    for input in tx.coin_data().from.iter().rev() {
        let tip = chain.ledger().tip(&input.address, &input.asset)?;
        if tip != nonce {
            return Err(strata_ledger::LedgerError::NonceMismatch {
                account: input.address,
                asset: input.asset,
                expected: tip,
                found: nonce,
            }
            .into());
        }
        journal.perform(
            chain,
            Compensation::RetractTip {
                account: input.address,
                asset: input.asset,
            },
        )?;
    }
    Ok(())
}

fn local_outputs<'a>(
    chain: &ChainContext,
    tx: &'a Transaction,
) -> impl Iterator<Item = &'a strata_transactions::CoinTo> {
    let local = chain.chain_id();
    tx.coin_data()
        .to
        .iter()
        .filter(move |o| o.address.chain_id() == local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_transactions::{CoinFrom, CoinTo, TxPayload};
    use strata_types::{Nonce, Timestamp};

    fn asset() -> AssetKey {
        AssetKey::new(ChainId::new(1), 1)
    }

    fn addr(chain: u16, b: u8) -> Address {
        Address::new(ChainId::new(chain), [b; 20])
    }

    fn transfer(inputs: &[(Address, u32)], outputs: &[(Address, u32)]) -> Transaction {
        let coin = CoinData::new(
            inputs
                .iter()
                .map(|(a, v)| CoinFrom {
                    address: *a,
                    asset: asset(),
                    amount: Amount::from(*v),
                    nonce: Nonce::GENESIS,
                })
                .collect(),
            outputs
                .iter()
                .map(|(a, v)| CoinTo {
                    address: *a,
                    asset: asset(),
                    amount: Amount::from(*v),
                })
                .collect(),
        );
        Transaction::from_payload(ChainId::new(1), Timestamp::new(1), &TxPayload::Transfer, coin)
    }

    #[test]
    fn outflow_and_minting() {
        let tx = transfer(&[(addr(1, 1), 100)], &[(addr(1, 2), 90)]);
        assert_eq!(net_outflow(tx.coin_data(), &asset()), Amount::from(10u32));
        assert!(check_no_minting(&tx, None).is_ok());

        let minting = transfer(&[(addr(1, 1), 10)], &[(addr(1, 2), 90)]);
        assert!(check_no_minting(&minting, None).is_err());
        assert!(check_no_minting(&minting, Some((&asset(), &Amount::from(80u32)))).is_ok());
    }

    #[test]
    fn released_deposit_goes_to_its_owner() {
        let release = Some((&asset(), &Amount::from(100u32)));
        let to_owner = transfer(&[], &[(addr(1, 1), 100)]);
        assert!(check_no_minting(&to_owner, release).is_ok());
        assert!(check_release_to(&to_owner, &asset(), &addr(1, 1)).is_ok());

        let to_stranger = transfer(&[], &[(addr(1, 9), 100)]);
        assert!(check_no_minting(&to_stranger, release).is_ok());
        assert!(check_release_to(&to_stranger, &asset(), &addr(1, 1)).is_err());

        // A third party may still be paid from the transaction's own inputs.
        let funded = transfer(&[(addr(1, 1), 10)], &[(addr(1, 1), 100), (addr(1, 9), 10)]);
        assert!(check_release_to(&funded, &asset(), &addr(1, 1)).is_ok());
    }

    #[test]
    fn foreign_addresses_need_permission() {
        let store = std::sync::Arc::new(strata_nullables::NullStore::new());
        let chain = ChainContext::new(strata_types::ChainConfig::new(ChainId::new(1)), store);
        let tx = transfer(&[(addr(1, 1), 100)], &[(addr(2, 2), 90)]);
        assert!(check_addresses(&chain, &tx, None).is_err());
        assert!(check_addresses(&chain, &tx, Some(ChainId::new(2))).is_ok());
        let foreign_input = transfer(&[(addr(2, 1), 100)], &[]);
        assert!(check_addresses(&chain, &foreign_input, Some(ChainId::new(2))).is_err());
    }
}
