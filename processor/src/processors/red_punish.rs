use strata_consensus::{AgentError, AgentStatus, PunishRecord};
use strata_transactions::{validation, RedPunishData, Transaction, TxType};
use strata_types::BlockHeader;

use super::coin;
use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::{Compensation, Journal};
use crate::processor::TransactionProcessor;

/// Disables a misbehaving agent. Its deposit stays locked.
pub struct RedPunishProcessor;

impl TransactionProcessor for RedPunishProcessor {
    fn tx_type(&self) -> TxType {
        TxType::RED_PUNISH
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        let data: RedPunishData = tx.payload_as()?;
        if data.evidence.is_empty() {
            return Err(ProcessorError::Parameter("punishment without evidence".to_string()));
        }
        chain.agents().get_active_node(&data.agent_id)?;
        if chain.agents().punish_record(tx.hash())?.is_some() {
            return Err(AgentError::AlreadyExists(format!("punishment {}", tx.hash())).into());
        }
        validation::validate_structure(tx)?;
        coin::check_addresses(chain, tx, None)?;
        coin::check_no_minting(tx, None)
    }

    fn commit_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        let data: RedPunishData = tx.payload_as()?;
        coin::apply_coin_data(chain, tx, journal)?;
        journal.perform(
            chain,
            Compensation::SavePunishRecord(PunishRecord {
                agent_id: data.agent_id,
                reason: data.reason,
                evidence: data.evidence,
                tx_hash: *tx.hash(),
                height: header.height,
                time: tx.time(),
            }),
        )?;
        journal.perform(
            chain,
            Compensation::SetStatus {
                agent: data.agent_id,
                status: AgentStatus::Punished,
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
        let data: RedPunishData = tx.payload_as()?;
        journal.perform(
            chain,
            Compensation::SetStatus {
                agent: data.agent_id,
                status: AgentStatus::Active,
                stop_height: None,
            },
        )?;
        journal.perform(chain, Compensation::RemovePunishRecord(*tx.hash()))?;
        coin::revert_coin_data(chain, tx, journal)
    }
}
