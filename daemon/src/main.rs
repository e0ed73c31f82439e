//! strata daemon: apply blocks to, roll back and inspect the chains of a
//! strata node from the command line.

mod fixture;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use strata_ledger::LedgerSnapshot;
use strata_node::{
    open_chains, BlockCommitOrchestrator, BlockOutcome, EngineMetrics, LogFormat, NodeConfig,
};
use strata_processor::ProcessorRegistry;
use strata_types::ChainId;

use crate::fixture::BlockFixture;

#[derive(Parser)]
#[command(name = "strata-daemon", about = "strata transaction-application engine")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override
    /// its settings.
    #[arg(long, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory; each chain gets an LMDB environment below it.
    #[arg(long, env = "STRATA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STRATA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STRATA_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Threads validating type batches in parallel.
    #[arg(long, env = "STRATA_VALIDATION_WORKERS")]
    validation_workers: Option<usize>,

    /// Print engine metrics in Prometheus text format after the command.
    #[arg(long, env = "STRATA_PRINT_METRICS")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,
    /// Open every configured chain, run migrations and integrity checks,
    /// and credit genesis allocations on first start.
    Check,
    /// Apply a JSON block fixture to a chain.
    Apply {
        #[arg(long)]
        chain: u16,
        block: PathBuf,
    },
    /// Roll back applied blocks.
    Rollback {
        #[arg(long)]
        chain: u16,
        /// Roll back every applied block above this height.
        #[arg(long, conflicts_with = "heights")]
        to: Option<u64>,
        /// Roll back exactly these blocks, highest first.
        #[arg(long, value_delimiter = ',')]
        heights: Vec<u64>,
    },
    /// Print balances, agents, aliases and applied blocks of a chain.
    Inspect {
        #[arg(long)]
        chain: u16,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(workers) = cli.validation_workers {
        config.validation_workers = workers;
    }
    config.check()?;
    Ok(config)
}

fn orchestrator(
    config: &NodeConfig,
    metrics: &Arc<EngineMetrics>,
) -> anyhow::Result<BlockCommitOrchestrator> {
    let engine = open_chains(config)?;
    let registry = ProcessorRegistry::standard();
    let orchestrator = BlockCommitOrchestrator::new(engine, registry, config.validation_workers)?
        .with_metrics(metrics.clone());
    Ok(orchestrator)
}

fn outcome_json(outcome: &BlockOutcome) -> serde_json::Value {
    json!({
        "chain_id": outcome.chain_id,
        "height": outcome.height,
        "phases": outcome.phases.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        "committed": outcome.committed,
        "rejected": outcome.rejected.iter().map(|r| json!({
            "tx_hash": r.tx_hash,
            "tx_type": r.tx_type.to_string(),
            "code": r.code,
            "reason": r.reason,
        })).collect::<Vec<_>>(),
        "representative_code": outcome.representative_code(),
        "failure": outcome.failure.as_ref().map(|f| json!({
            "tx_type": f.tx_type.to_string(),
            "code": f.code,
            "reason": f.reason,
        })),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    strata_node::init_logging(config.log_format, &config.log_level)
        .map_err(anyhow::Error::msg)?;

    let metrics = Arc::new(EngineMetrics::new()?);

    match &cli.command {
        Command::Config => print!("{}", config.to_toml_string()?),
        Command::Check => {
            let engine = open_chains(&config)?;
            tracing::info!(chains = engine.len(), "all chains opened");
        }
        Command::Apply { chain, block } => {
            let chain_id = ChainId::new(*chain);
            let mut orchestrator = orchestrator(&config, &metrics)?;
            let fixture = BlockFixture::from_file(block)?;
            let (header, txs) = fixture.build(orchestrator.engine().chain(chain_id)?)?;
            let outcome = orchestrator
                .apply_block(chain_id, &header, txs)
                .with_context(|| format!("applying block {} to chain {chain_id}", header.height))?;
            println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
        }
        Command::Rollback { chain, to, heights } => {
            let chain_id = ChainId::new(*chain);
            let mut orchestrator = orchestrator(&config, &metrics)?;
            let rolled_back = match to {
                Some(height) => orchestrator.rollback_to(chain_id, *height)?,
                None if !heights.is_empty() => orchestrator.rollback_blocks(chain_id, heights)?,
                None => anyhow::bail!("give --to <height> or --heights <h1,h2,..>"),
            };
            let heights: Vec<u64> = rolled_back.iter().map(|b| b.height()).collect();
            tracing::info!(chain = %chain_id, ?heights, "rollback complete");
            println!("{}", serde_json::to_string_pretty(&json!({ "rolled_back": heights }))?);
        }
        Command::Inspect { chain } => {
            let chain_id = ChainId::new(*chain);
            let orchestrator = orchestrator(&config, &metrics)?;
            let context = orchestrator.engine().chain(chain_id)?;
            let snapshot = LedgerSnapshot::capture(context.ledger())?;
            let applied: Vec<_> = orchestrator
                .applied_blocks(chain_id)?
                .iter()
                .map(|b| json!({
                    "height": b.height(),
                    "hash": b.header.hash,
                    "previous": b.previous,
                    "transactions": b.tx_count(),
                }))
                .collect();
            let report = json!({
                "chain_id": chain_id,
                "ledger": snapshot,
                "agents": context.agents().agents()?,
                "aliases": context.aliases().all()?,
                "applied_blocks": applied,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if cli.metrics {
        print!("{}", metrics.encode_text()?);
    }
    Ok(())
}
