//! strata node: drives blocks of transactions through the engine.
//!
//! The node is the top-level coordinator that:
//! - Opens every configured chain and credits its genesis allocations
//! - Screens each proposed block (conflict detection, per-type validation)
//! - Commits the survivors type by type, rolling the block back on failure
//! - Rolls applied blocks back, last first, on reorganization
//! - Initialises logging and exposes engine metrics

pub mod applied;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod tracing_spans;

pub use applied::AppliedBlock;
pub use bootstrap::{bootstrap_chain, open_chains};
pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::EngineMetrics;
pub use orchestrator::{BlockCommitOrchestrator, BlockFailure, BlockOutcome, BlockPhase};
