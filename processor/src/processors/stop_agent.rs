use strata_consensus::AgentStatus;
use strata_transactions::{validation, StopAgentData, Transaction, TxType};
use strata_types::BlockHeader;

use super::coin;
use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::{Compensation, Journal};
use crate::processor::TransactionProcessor;

/// Stops an agent at the owner's request and unlocks its deposit.
pub struct StopAgentProcessor;

impl TransactionProcessor for StopAgentProcessor {
    fn tx_type(&self) -> TxType {
        TxType::STOP_AGENT
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        let data: StopAgentData = tx.payload_as()?;
        let agent = chain.agents().get_active_node(&data.agent_id)?;
        if data.address != agent.agent_address {
            return Err(ProcessorError::Parameter(format!(
                "{} does not own agent {}",
                data.address, agent.id
            )));
        }
        validation::validate_structure(tx)?;
        coin::check_addresses(chain, tx, None)?;
        let staking = chain.config().staking_asset();
        coin::check_no_minting(tx, Some((&staking, &agent.deposit)))?;
        coin::check_release_to(tx, &staking, &agent.agent_address)
    }

    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        let data: StopAgentData = tx.payload_as()?;
        coin::apply_coin_data(chain, tx, journal)?;
        journal.perform(
            chain,
            Compensation::SetStatus {
                agent: data.agent_id,
                status: AgentStatus::Stopped,
                stop_height: Some(header.height),
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
        let data: StopAgentData = tx.payload_as()?;
        journal.perform(
            chain,
            Compensation::SetStatus {
                agent: data.agent_id,
                status: AgentStatus::Active,
                stop_height: None,
            },
        )?;
        coin::revert_coin_data(chain, tx, journal)
    }
}
