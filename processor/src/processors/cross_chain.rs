use strata_store::Keyspace;
use strata_transactions::{
    validation, CoinTo, CrossChainData, Decoder, Encoder, Transaction, TxType,
};
use strata_types::{BlockHeader, TxHash};

use super::coin;
use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::{Compensation, Journal};
use crate::processor::TransactionProcessor;

/// Sends coins to another chain.
///
/// Outputs on the local chain are credited as usual. Outputs on the target
/// chain are written to the outbox, keyed by transaction hash, for relay.
pub struct CrossChainProcessor;

fn foreign_outputs(chain: &ChainContext, tx: &Transaction) -> Vec<CoinTo> {
    tx.coin_data()
        .to
        .iter()
        .filter(|o| o.address.chain_id() != chain.chain_id())
        .cloned()
        .collect()
}

fn encode_outputs(outputs: &[CoinTo]) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.put_list(outputs);
    enc.into_bytes()
}

/// Outputs of a committed cross-chain transaction still waiting for relay.
pub fn pending_outbound(
    chain: &ChainContext,
    tx_hash: &TxHash,
) -> Result<Option<Vec<CoinTo>>, ProcessorError> {
    match chain.store().get(Keyspace::CrossChainOutbox, tx_hash.as_bytes())? {
        Some(bytes) => {
            let mut dec = Decoder::new(&bytes);
            let outputs = dec.get_list()?;
            dec.finish()?;
            Ok(Some(outputs))
        }
        None => Ok(None),
    }
}

impl TransactionProcessor for CrossChainProcessor {
    fn tx_type(&self) -> TxType {
        TxType::CROSS_CHAIN
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        let data: CrossChainData = tx.payload_as()?;
        if data.target_chain == chain.chain_id() {
            return Err(ProcessorError::Parameter(format!(
                "cross-chain transfer targets its own chain {}",
                data.target_chain
            )));
        }
        validation::validate_spending(tx)?;
        coin::check_addresses(chain, tx, Some(data.target_chain))?;
        if foreign_outputs(chain, tx).is_empty() {
            return Err(ProcessorError::Parameter(format!(
                "no output on target chain {}",
                data.target_chain
            )));
        }
        coin::check_no_minting(tx, None)
    }

    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        coin::apply_coin_data(chain, tx, journal)?;
        journal.perform(
            chain,
            Compensation::PutOutbox {
                tx_hash: *tx.hash(),
                bytes: encode_outputs(&foreign_outputs(chain, tx)),
            },
        )
    }

    fn rollback_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        journal.perform(chain, Compensation::DeleteOutbox(*tx.hash()))?;
        coin::revert_coin_data(chain, tx, journal)
    }
}
