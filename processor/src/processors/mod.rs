//! One processor per transaction type.

pub(crate) mod coin;

mod alias;
mod cross_chain;
mod deposit;
mod red_punish;
mod register_agent;
mod stop_agent;
mod transfer;

pub use alias::SetAliasProcessor;
pub use cross_chain::{pending_outbound, CrossChainProcessor};
pub use deposit::{AppendDepositProcessor, ReduceDepositProcessor};
pub use red_punish::RedPunishProcessor;
pub use register_agent::RegisterAgentProcessor;
pub use stop_agent::StopAgentProcessor;
pub use transfer::TransferProcessor;
