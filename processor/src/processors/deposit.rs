//! Deposit changes on a live agent.

use strata_consensus::{AgentError, AgentRecord, DepositRecord};
use strata_transactions::{validation, ChangeDepositData, Transaction, TxType};
use strata_types::{Amount, BlockHeader};

use super::coin;
use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::{Compensation, Journal};
use crate::processor::TransactionProcessor;

/// Checks common to both directions: the payload names a live agent owned
/// by its address, the amount meets `min_change`, the new total stays in
/// bounds and the change has not been applied already.
fn check_change(
    chain: &ChainContext,
    tx: &Transaction,
    min_change: &Amount,
    already_applied: bool,
    new_total: impl Fn(&Amount, &Amount) -> Amount,
) -> Result<(ChangeDepositData, AgentRecord), ProcessorError> {
    let data: ChangeDepositData = tx.payload_as()?;
    if data.amount < *min_change {
        return Err(ProcessorError::OutOfRange(format!(
            "deposit change {} is below the minimum {min_change}",
            data.amount
        )));
    }
    let agent = chain.agents().get_active_node(&data.agent_id)?;
    if data.address != agent.agent_address {
        return Err(ProcessorError::Parameter(format!(
            "{} does not own agent {}",
            data.address, agent.id
        )));
    }
    let total = new_total(&agent.deposit, &data.amount);
    if !agent.bounds.contains(&total) {
        return Err(AgentError::OutOfRange {
            id: agent.id,
            total,
            min: agent.bounds.min.clone(),
            max: agent.bounds.max.clone(),
        }
        .into());
    }
    if already_applied {
        return Err(AgentError::AlreadyExists(format!("deposit change {}", tx.hash())).into());
    }
    Ok((data, agent))
}

fn record_for(data: &ChangeDepositData, tx: &Transaction, header: &BlockHeader) -> DepositRecord {
    DepositRecord {
        agent_id: data.agent_id,
        address: data.address,
        amount: data.amount.clone(),
        tx_hash: *tx.hash(),
        height: header.height,
        time: tx.time(),
    }
}

/// Adds to an agent's deposit. The coin data must lock the added amount.
pub struct AppendDepositProcessor;

impl TransactionProcessor for AppendDepositProcessor {
    fn tx_type(&self) -> TxType {
        TxType::APPEND_DEPOSIT
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        let applied = chain.agents().append_record(tx.hash())?.is_some();
        let (data, agent) =
            check_change(chain, tx, &chain.config().append_min, applied, |d, a| d + a)?;

        validation::validate_spending(tx)?;
        coin::check_addresses(chain, tx, None)?;
        coin::check_no_minting(tx, None)?;
        let staking = chain.config().staking_asset();
        coin::require_input_from(tx, &agent.agent_address, &staking)?;
        let locked = coin::net_outflow(tx.coin_data(), &staking);
        if locked < data.amount {
            return Err(ProcessorError::Parameter(format!(
                "coin data locks {locked}, append is {}",
                data.amount
            )));
        }
        Ok(())
    }

    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        let data: ChangeDepositData = tx.payload_as()?;
        let agent = chain.agents().get_node(&data.agent_id)?;
        coin::apply_coin_data(chain, tx, journal)?;
        journal.perform(chain, Compensation::SaveAppendRecord(record_for(&data, tx, header)))?;
        journal.perform(
            chain,
            Compensation::SetDeposit {
                agent: agent.id,
                total: &agent.deposit + &data.amount,
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
        let data: ChangeDepositData = tx.payload_as()?;
        let agent = chain.agents().get_node(&data.agent_id)?;
        journal.perform(
            chain,
            Compensation::SetDeposit {
                agent: agent.id,
                total: &agent.deposit - &data.amount,
            },
        )?;
        journal.perform(chain, Compensation::RemoveAppendRecord(*tx.hash()))?;
        coin::revert_coin_data(chain, tx, journal)
    }
}

/// Withdraws part of an agent's deposit. The coin data may release up to
/// the withdrawn amount.
pub struct ReduceDepositProcessor;

impl TransactionProcessor for ReduceDepositProcessor {
    fn tx_type(&self) -> TxType {
        TxType::REDUCE_DEPOSIT
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        let applied = chain.agents().reduce_record(tx.hash())?.is_some();
        let (data, agent) =
            check_change(chain, tx, &chain.config().reduce_min, applied, |d, a| d - a)?;

        validation::validate_structure(tx)?;
        coin::check_addresses(chain, tx, None)?;
        let staking = chain.config().staking_asset();
        coin::check_no_minting(tx, Some((&staking, &data.amount)))?;
        coin::check_release_to(tx, &staking, &agent.agent_address)
    }

    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        let data: ChangeDepositData = tx.payload_as()?;
        let agent = chain.agents().get_node(&data.agent_id)?;
        coin::apply_coin_data(chain, tx, journal)?;
        journal.perform(chain, Compensation::SaveReduceRecord(record_for(&data, tx, header)))?;
        journal.perform(
            chain,
            Compensation::SetDeposit {
                agent: agent.id,
                total: &agent.deposit - &data.amount,
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
        let data: ChangeDepositData = tx.payload_as()?;
        let agent = chain.agents().get_node(&data.agent_id)?;
        journal.perform(
            chain,
            Compensation::SetDeposit {
                agent: agent.id,
                total: &agent.deposit + &data.amount,
            },
        )?;
        journal.perform(chain, Compensation::RemoveReduceRecord(*tx.hash()))?;
        coin::revert_coin_data(chain, tx, journal)
    }
}
