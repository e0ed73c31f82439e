use strata_consensus::{AgentError, AgentRecord, AgentStatus};
use strata_transactions::{validation, RegisterAgentData, Transaction, TxType};
use strata_types::{BlockHeader, NodeId};

use super::coin;
use crate::batch::BlockTxs;
use crate::context::ChainContext;
use crate::error::ProcessorError;
use crate::journal::{Compensation, Journal};
use crate::processor::TransactionProcessor;

/// Registers a consensus agent and locks its deposit.
///
/// The locked amount is whatever the coin data takes out of circulation in
/// the staking asset; it must cover the declared deposit.
pub struct RegisterAgentProcessor;

impl TransactionProcessor for RegisterAgentProcessor {
    fn tx_type(&self) -> TxType {
        TxType::REGISTER_AGENT
    }

    fn check(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _block: &BlockTxs,
        _header: Option<&BlockHeader>,
    ) -> Result<(), ProcessorError> {
        let data: RegisterAgentData = tx.payload_as()?;
        let config = chain.config();
        let id = NodeId::from_registration(*tx.hash());

        for address in [&data.agent_address, &data.packing_address, &data.reward_address] {
            if address.chain_id() != chain.chain_id() {
                return Err(ProcessorError::Parameter(format!(
                    "agent address {address} is not on chain {}",
                    chain.chain_id()
                )));
            }
        }
        if data.agent_address == data.packing_address {
            return Err(ProcessorError::Parameter(
                "packing address must differ from the agent address".to_string(),
            ));
        }
        if !(config.commission_min..=config.commission_max).contains(&data.commission_rate) {
            return Err(ProcessorError::OutOfRange(format!(
                "commission rate {} outside {}..={}",
                data.commission_rate, config.commission_min, config.commission_max
            )));
        }
        if !config.deposit.contains(&data.deposit) {
            return Err(AgentError::OutOfRange {
                id,
                total: data.deposit,
                min: config.deposit.min.clone(),
                max: config.deposit.max.clone(),
            }
            .into());
        }

        validation::validate_spending(tx)?;
        coin::check_addresses(chain, tx, None)?;
        coin::check_no_minting(tx, None)?;
        let staking = config.staking_asset();
        coin::require_input_from(tx, &data.agent_address, &staking)?;
        let locked = coin::net_outflow(tx.coin_data(), &staking);
        if locked < data.deposit {
            return Err(ProcessorError::Parameter(format!(
                "coin data locks {locked}, deposit is {}",
                data.deposit
            )));
        }

        let agents = chain.agents();
        if agents.find_node(&id)?.is_some() {
            return Err(AgentError::AlreadyExists(format!("agent {id}")).into());
        }
        if let Some(live) = agents.node_for_address(&data.agent_address)? {
            return Err(AgentError::AlreadyExists(format!(
                "live agent {live} for address {}",
                data.agent_address
            ))
            .into());
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
        let data: RegisterAgentData = tx.payload_as()?;
        let record = AgentRecord {
            id: NodeId::from_registration(*tx.hash()),
            agent_address: data.agent_address,
            packing_address: data.packing_address,
            reward_address: data.reward_address,
            commission_rate: data.commission_rate,
            deposit: data.deposit.clone(),
            initial_deposit: data.deposit,
            bounds: chain.config().deposit.clone(),
            status: AgentStatus::Active,
            registered_height: header.height,
            registered_time: tx.time(),
            stop_height: None,
        };
        coin::apply_coin_data(chain, tx, journal)?;
        journal.perform(chain, Compensation::RegisterAgent(Box::new(record)))
    }

    fn rollback_tx(
        &self,
        chain: &ChainContext,
        tx: &Transaction,
        _header: &BlockHeader,
        journal: &mut Journal,
    ) -> Result<(), ProcessorError> {
        journal.perform(
            chain,
            Compensation::RemoveAgent(NodeId::from_registration(*tx.hash())),
        )?;
        coin::revert_coin_data(chain, tx, journal)
    }
}
