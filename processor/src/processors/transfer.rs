use strata_transactions::{validation, Transaction, TxType};
use strata_types::BlockHeader;

use super::coin;
use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::Journal;
use crate::processor::TransactionProcessor;

/// Plain value transfer: coin data only.
pub struct TransferProcessor;

impl TransactionProcessor for TransferProcessor {
    fn tx_type(&self) -> TxType {
        TxType::TRANSFER
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        validation::validate_spending(tx)?;
        coin::check_addresses(chain, tx, None)?;
        coin::check_no_minting(tx, None)
    }

    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        coin::apply_coin_data(chain, tx, journal)
    }

    fn rollback_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        coin::revert_coin_data(chain, tx, journal)
    }
}
