//! Consensus agent records.

use serde::{Deserialize, Serialize};
use std::fmt;
use strata_types::{Address, Amount, DepositBounds, NodeId, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentStatus {
    Active,
    Stopped,
    Punished,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Stopped => "stopped",
            Self::Punished => "punished",
        })
    }
}

/// A registered consensus agent.
///
/// Records are never deleted once a registration is final: stopping or
/// punishing an agent only changes its status, which keeps the deposit
/// history auditable. Only rolling back the registration itself removes one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Hash of the registration transaction.
    pub id: NodeId,
    /// Owner; deposits are locked from and returned to this address.
    pub agent_address: Address,
    pub packing_address: Address,
    pub reward_address: Address,
    /// Percent.
    pub commission_rate: u8,
    pub deposit: Amount,
    pub initial_deposit: Amount,
    /// Chain deposit bounds in force when the agent registered.
    pub bounds: DepositBounds,
    pub status: AgentStatus,
    pub registered_height: u64,
    pub registered_time: Timestamp,
    pub stop_height: Option<u64>,
}

impl AgentRecord {
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}
