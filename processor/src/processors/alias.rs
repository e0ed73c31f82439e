use strata_ledger::LedgerError;
use strata_transactions::{validation, SetAliasData, Transaction, TxType};
use strata_types::BlockHeader;

use super::coin;
use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::{Compensation, Journal};
use crate::processor::TransactionProcessor;

/// Binds an alias to an address for a burned fee.
pub struct SetAliasProcessor;

impl TransactionProcessor for SetAliasProcessor {
    fn tx_type(&self) -> TxType {
        TxType::SET_ALIAS
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        let data: SetAliasData = tx.payload_as()?;
        if !data.alias_is_well_formed() {
            return Err(ProcessorError::Parameter(format!(
                "alias '{}' is not well formed",
                data.alias
            )));
        }
        if data.address.chain_id() != chain.chain_id() {
            return Err(ProcessorError::Parameter(format!(
                "alias address {} is not on chain {}",
                data.address,
                chain.chain_id()
            )));
        }
        validation::validate_spending(tx)?;
        coin::check_addresses(chain, tx, None)?;
        coin::check_no_minting(tx, None)?;

        let fee_asset = chain.config().staking_asset();
        coin::require_input_from(tx, &data.address, &fee_asset)?;
        let burned = coin::net_outflow(tx.coin_data(), &fee_asset);
        if burned < chain.config().alias_fee {
            return Err(ProcessorError::Parameter(format!(
                "alias fee {burned} is below {}",
                chain.config().alias_fee
            )));
        }

        if chain.aliases().address_of(&data.alias)?.is_some() {
            return Err(LedgerError::AliasTaken(data.alias).into());
        }
        if chain.aliases().alias_of(&data.address)?.is_some() {
            return Err(LedgerError::AddressHasAlias(data.address).into());
        }
        Ok(())
    }

    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        let data: SetAliasData = tx.payload_as()?;
        coin::apply_coin_data(chain, tx, journal)?;
        journal.perform(
            chain,
            Compensation::SetAlias {
                address: data.address,
                alias: data.alias,
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
        let data: SetAliasData = tx.payload_as()?;
        journal.perform(
            chain,
            Compensation::RemoveAlias {
                address: data.address,
                alias: data.alias,
            },
        )?;
        coin::revert_coin_data(chain, tx, journal)
    }
}
