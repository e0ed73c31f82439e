//! Intra-block conflict detection.
//!
//! Runs over the whole candidate set before per-type validation and removes
//! transactions that are only invalid in combination with others proposed
//! for the same block:
//!
//! - Agents stopped or punished in the block are poisoned. Every deposit
//!   append or reduce targeting a poisoned agent is rejected with
//!   `ConflictError`, wherever it appears in the block.
//! - An agent may be disabled by one transaction per block; later stop or
//!   punish transactions for it conflict.
//! - Two registrations for one agent address, or two alias bindings for one
//!   alias or one address, conflict; the first in declared order is kept.
//! - Every surviving transaction's debits are replayed in commit order by
//!   [`CoinDataChecker`]. In the same pass deposit changes are summed per
//!   agent on top of its committed deposit, appends first, then reduces, in
//!   declared order. A change that would take the running total outside the
//!   agent's bounds is rejected with `OutOfRange`. A change counts toward
//!   the total only once its debits replay cleanly.
//!
//! The result depends on which transactions are in the block, so callers
//! that later drop transactions for other reasons run detection again on
//! what is left.

use std::collections::{HashMap, HashSet};

use strata_consensus::AgentError;
use strata_transactions::{
    ChangeDepositData, RedPunishData, RegisterAgentData, SetAliasData, StopAgentData, Transaction,
    TxType,
};
use strata_types::{Address, Amount, NodeId, TxHash};

use crate::batch::BlockTxs;
use crate::coin_check::CoinDataChecker;
use crate::context::ChainContext;
use crate::error::{ProcessorError, Rejection};

#[derive(Clone, Copy, Debug, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Every transaction of `block` that conflicts with another one.
    pub fn detect(&self, chain: &ChainContext, block: &BlockTxs) -> Vec<Rejection> {
        let mut found = Conflicts::default();

        let poisoned = disabled_agents(block, &mut found);
        poisoned_deposit_changes(block, &poisoned, &mut found);
        first_claim_wins(block.of(TxType::REGISTER_AGENT), &mut found, |tx| {
            let data: RegisterAgentData = tx.payload_as().ok()?;
            Some(vec![Claim::AgentAddress(data.agent_address)])
        });
        first_claim_wins(block.of(TxType::SET_ALIAS), &mut found, |tx| {
            let data: SetAliasData = tx.payload_as().ok()?;
            Some(vec![Claim::Alias(data.alias), Claim::AliasOwner(data.address)])
        });

        let mut coin = CoinDataChecker::new();
        let mut running: HashMap<NodeId, Amount> = HashMap::new();
        for tx in block.iter_commit_order() {
            if found.contains(tx.hash()) {
                continue;
            }
            let spent = deposit_total(chain, tx, &running)
                .and_then(|total| coin.spend(chain, tx).map(|()| total));
            match spent {
                Ok(Some((agent, total))) => {
                    running.insert(agent, total);
                }
                Ok(None) => {}
                Err(e) => found.reject(tx, e),
            }
        }
        found.rejections
    }
}

/// Rejections of one detection pass, first rejection per transaction.
#[derive(Default)]
struct Conflicts {
    rejections: Vec<Rejection>,
    hashes: HashSet<TxHash>,
}

impl Conflicts {
    fn reject(&mut self, tx: &Transaction, error: ProcessorError) {
        if self.hashes.insert(*tx.hash()) {
            tracing::debug!(
                tx = %tx.hash(),
                tx_type = %tx.tx_type(),
                code = %error.code(),
                error = %error,
                "in-block conflict"
            );
            self.rejections
                .push(Rejection::from_error(*tx.hash(), tx.tx_type(), &error));
        }
    }

    fn contains(&self, tx_hash: &TxHash) -> bool {
        self.hashes.contains(tx_hash)
    }
}

/// Agents stopped or punished in this block. Payloads that fail to decode
/// are left for their own processor to reject.
fn disabled_agents(block: &BlockTxs, found: &mut Conflicts) -> HashSet<NodeId> {
    let mut poisoned = HashSet::new();
    let punished = block
        .of(TxType::RED_PUNISH)
        .iter()
        .filter_map(|tx| Some((tx, tx.payload_as::<RedPunishData>().ok()?.agent_id)));
    let stopped = block
        .of(TxType::STOP_AGENT)
        .iter()
        .filter_map(|tx| Some((tx, tx.payload_as::<StopAgentData>().ok()?.agent_id)));

    for (tx, agent) in punished.chain(stopped) {
        if !poisoned.insert(agent) {
            let reason = format!("agent {agent} is already disabled in this block");
            found.reject(tx, ProcessorError::Conflict(reason));
        }
    }
    poisoned
}

fn deposit_changes(block: &BlockTxs) -> impl Iterator<Item = &Transaction> + '_ {
    block
        .of(TxType::APPEND_DEPOSIT)
        .iter()
        .chain(block.of(TxType::REDUCE_DEPOSIT))
}

fn poisoned_deposit_changes(block: &BlockTxs, poisoned: &HashSet<NodeId>, found: &mut Conflicts) {
    for tx in deposit_changes(block) {
        let Ok(data) = tx.payload_as::<ChangeDepositData>() else {
            continue;
        };
        if poisoned.contains(&data.agent_id) {
            found.reject(
                tx,
                ProcessorError::Conflict(format!(
                    "agent {} is stopped or punished in this block",
                    data.agent_id
                )),
            );
        }
    }
}

/// The agent's running total once `tx` is added to it, if `tx` is a
/// deposit change. Other transaction types, undecodable payloads and
/// unknown agents are left to per-type validation.
fn deposit_total(
    chain: &ChainContext,
    tx: &Transaction,
    running: &HashMap<NodeId, Amount>,
) -> Result<Option<(NodeId, Amount)>, ProcessorError> {
    let append = match tx.tx_type() {
        TxType::APPEND_DEPOSIT => true,
        TxType::REDUCE_DEPOSIT => false,
        _ => return Ok(None),
    };
    let Ok(data) = tx.payload_as::<ChangeDepositData>() else {
        return Ok(None);
    };
    let Some(agent) = chain.agents().find_node(&data.agent_id)? else {
        return Ok(None);
    };
    let current = running
        .get(&agent.id)
        .cloned()
        .unwrap_or_else(|| agent.deposit.clone());
    let total = if append {
        &current + &data.amount
    } else {
        &current - &data.amount
    };
    if !agent.bounds.contains(&total) {
        return Err(AgentError::OutOfRange {
            id: agent.id,
            total,
            min: agent.bounds.min.clone(),
            max: agent.bounds.max.clone(),
        }
        .into());
    }
    Ok(Some((agent.id, total)))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Claim {
    AgentAddress(Address),
    Alias(String),
    AliasOwner(Address),
}

/// Reject every transaction that claims something an earlier one in `txs`
/// already claimed.
fn first_claim_wins(
    txs: &[Transaction],
    found: &mut Conflicts,
    claims_of: impl Fn(&Transaction) -> Option<Vec<Claim>>,
) {
    let mut claimed: HashMap<Claim, TxHash> = HashMap::new();
    for tx in txs {
        let Some(claims) = claims_of(tx) else {
            continue;
        };
        if let Some(owner) = claims.iter().find_map(|c| claimed.get(c)) {
            found.reject(
                tx,
                ProcessorError::Conflict(format!("claims what transaction {owner} already claims")),
            );
            continue;
        }
        for claim in claims {
            claimed.insert(claim, *tx.hash());
        }
    }
}
