//! Consensus agent and deposit state.
//!
//! Agents are registered with a locked deposit that must stay within the
//! chain's bounds. Every deposit change and penalty leaves an audit record
//! keyed by its transaction hash, so the current deposit can always be
//! reconciled against its history and every change undone by hash.
//!
//! - [`agent`]: agent records and status.
//! - [`records`]: deposit and punish audit records.
//! - [`manager`]: [`AgentManager`], the only writer of consensus state.
//! - [`error`]: consensus error types.

pub mod agent;
pub mod error;
pub mod manager;
pub mod records;

pub use agent::{AgentRecord, AgentStatus};
pub use error::AgentError;
pub use manager::{AgentManager, DepositAudit};
pub use records::{DepositRecord, PunishRecord};
