//! Block commit orchestrator.
//!
//! Drives one block of one chain through `Proposed -> ConflictChecked ->
//! Validated -> Committed | PartiallyCommittedThenRolledBack -> Final`:
//!
//! 1. Duplicate hashes are dropped; transactions of unknown types or of
//!    another chain are rejected.
//! 2. The conflict detector and every type's `validate` run until
//!    validation rejects nothing more. Validation rejections are final;
//!    conflicts are recomputed over what remains after each round.
//!    Validation of the type batches runs on the worker pool since it only
//!    reads committed state.
//! 3. The surviving batches are committed one type at a time in commit
//!    priority order. Each commit returns a journal; if a later type fails,
//!    the journals of the types already committed are unwound newest first.
//! 4. A committed block is recorded so that a reorganization can roll it
//!    back, last block first.
//!
//! Commit and rollback take `&mut self`: one orchestrator never applies two
//! blocks at once.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use strata_processor::{
    representative_code, BlockTxs, ChainContext, ConflictDetector, EngineContext, Journal,
    ProcessorError, ProcessorRegistry, Rejection,
};
use strata_store::KvStore;
use strata_transactions::{Transaction, TxType};
use strata_types::{BlockHeader, ChainId, ErrorCode, TxHash};

use crate::applied::{self, AppliedBlock};
use crate::metrics::EngineMetrics;
use crate::tracing_spans::{
    block_apply_span, block_rollback_span, type_commit_span, type_validate_span,
};
use crate::NodeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockPhase {
    Proposed,
    ConflictChecked,
    Validated,
    Committed,
    PartiallyCommittedThenRolledBack,
    Final,
}

impl fmt::Display for BlockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockPhase::Proposed => "proposed",
            BlockPhase::ConflictChecked => "conflict_checked",
            BlockPhase::Validated => "validated",
            BlockPhase::Committed => "committed",
            BlockPhase::PartiallyCommittedThenRolledBack => "partially_committed_then_rolled_back",
            BlockPhase::Final => "final",
        };
        f.write_str(name)
    }
}

/// Why a block's commit failed after validation passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockFailure {
    pub tx_type: TxType,
    pub code: ErrorCode,
    pub reason: String,
}

/// What happened to one block.
#[derive(Clone, Debug)]
pub struct BlockOutcome {
    pub chain_id: ChainId,
    pub height: u64,
    /// Phases the block went through, in order.
    pub phases: Vec<BlockPhase>,
    /// Committed transactions in commit order. Empty when the block failed.
    pub committed: Vec<TxHash>,
    pub rejected: Vec<Rejection>,
    pub failure: Option<BlockFailure>,
}

impl BlockOutcome {
    fn new(chain_id: ChainId, height: u64) -> Self {
        Self {
            chain_id,
            height,
            phases: vec![BlockPhase::Proposed],
            committed: Vec::new(),
            rejected: Vec::new(),
            failure: None,
        }
    }

    fn advance(&mut self, phase: BlockPhase) {
        tracing::debug!(chain = %self.chain_id, height = self.height, %phase, "block phase");
        self.phases.push(phase);
    }

    pub fn is_committed(&self) -> bool {
        self.failure.is_none()
    }

    /// The phase before `Final`: how the block ended.
    pub fn result_phase(&self) -> Option<BlockPhase> {
        self.phases
            .iter()
            .rev()
            .find(|p| **p != BlockPhase::Final)
            .copied()
    }

    /// Code of the first rejected transaction.
    pub fn representative_code(&self) -> Option<ErrorCode> {
        representative_code(&self.rejected)
    }

    pub fn rejection(&self, tx_hash: &TxHash) -> Option<&Rejection> {
        self.rejected.iter().find(|r| r.tx_hash == *tx_hash)
    }
}

pub struct BlockCommitOrchestrator {
    engine: EngineContext,
    registry: ProcessorRegistry,
    detector: ConflictDetector,
    pool: rayon::ThreadPool,
    metrics: Option<Arc<EngineMetrics>>,
}

impl BlockCommitOrchestrator {
    pub fn new(
        engine: EngineContext,
        registry: ProcessorRegistry,
        validation_workers: usize,
    ) -> Result<Self, NodeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(validation_workers.max(1))
            .thread_name(|i| format!("strata-validate-{i}"))
            .build()
            .map_err(|e| NodeError::WorkerPool(e.to_string()))?;
        Ok(Self {
            engine,
            registry,
            detector: ConflictDetector::new(),
            pool,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn engine(&self) -> &EngineContext {
        &self.engine
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Height of the last block applied to `chain_id`.
    pub fn last_applied(&self, chain_id: ChainId) -> Result<Option<u64>, NodeError> {
        let chain = self.engine.chain(chain_id)?;
        Ok(applied::tip(chain.store().as_ref())?)
    }

    /// Applied blocks of `chain_id` still on record, lowest first.
    pub fn applied_blocks(&self, chain_id: ChainId) -> Result<Vec<AppliedBlock>, NodeError> {
        let chain = self.engine.chain(chain_id)?;
        Ok(applied::all(chain.store().as_ref())?)
    }

    /// Screen and commit the candidate transactions of one block.
    ///
    /// Rejected transactions and a failed commit are reported in the
    /// outcome; the chain is then exactly as before the call. An `Err` is
    /// returned for problems outside the block itself (unknown chain, block
    /// out of order, store failure) and for state corruption.
    pub fn apply_block(
        &mut self,
        chain_id: ChainId,
        header: &BlockHeader,
        txs: Vec<Transaction>,
    ) -> Result<BlockOutcome, NodeError> {
        let span = block_apply_span(chain_id, header, txs.len());
        let _enter = span.enter();
        let started = Instant::now();

        let chain = self.engine.chain(chain_id)?;
        let last = applied::tip(chain.store().as_ref())?;
        if let Some(last) = last {
            if header.height <= last {
                return Err(NodeError::HeightOutOfOrder {
                    chain: chain_id,
                    height: header.height,
                    last,
                });
            }
        }

        let mut outcome = BlockOutcome::new(chain_id, header.height);
        let mut block = self.admit(chain, txs, &mut outcome);
        self.screen(chain, &mut block, header, &mut outcome);

        let result = self.commit(chain, &block, header, last, &mut outcome);
        if let Some(metrics) = &self.metrics {
            metrics.txs_rejected.inc_by(outcome.rejected.len() as u64);
            let conflicts = outcome
                .rejected
                .iter()
                .filter(|r| r.code == ErrorCode::ConflictError)
                .count();
            metrics.conflicts.inc_by(conflicts as u64);
            match &result {
                Ok(()) if outcome.is_committed() => {
                    metrics.blocks_applied.inc();
                    metrics.txs_committed.inc_by(outcome.committed.len() as u64);
                }
                _ => metrics.blocks_failed.inc(),
            }
            metrics
                .apply_time_ms
                .observe(started.elapsed().as_secs_f64() * 1000.0);
        }
        result?;

        outcome.advance(BlockPhase::Final);
        tracing::info!(
            committed = outcome.committed.len(),
            rejected = outcome.rejected.len(),
            result = ?outcome.result_phase(),
            "block processed"
        );
        Ok(outcome)
    }

    /// Drop duplicate hashes, and reject what no processor of this chain
    /// can handle.
    fn admit(
        &self,
        chain: &ChainContext,
        txs: Vec<Transaction>,
        outcome: &mut BlockOutcome,
    ) -> BlockTxs {
        let mut seen = HashSet::new();
        let mut admitted = Vec::with_capacity(txs.len());
        for tx in txs {
            if !seen.insert(*tx.hash()) {
                tracing::warn!(tx = %tx.hash(), "duplicate transaction dropped");
                continue;
            }
            let error = if let Err(e) = self.registry.get(tx.tx_type()) {
                Some(e)
            } else if tx.chain_id() != chain.chain_id() {
                Some(ProcessorError::Parameter(format!(
                    "transaction for chain {} in a block of chain {}",
                    tx.chain_id(),
                    chain.chain_id()
                )))
            } else {
                None
            };
            match error {
                Some(e) => {
                    tracing::warn!(
                        tx = %tx.hash(),
                        tx_type = %tx.tx_type(),
                        code = %e.code(),
                        error = %e,
                        "transaction rejected"
                    );
                    outcome.rejected.push(Rejection::from_error(*tx.hash(), tx.tx_type(), &e));
                }
                None => admitted.push(tx),
            }
        }
        BlockTxs::new(admitted)
    }

    /// Alternate conflict detection and validation until the surviving set
    /// is stable. Validation rejections are final. Conflicts are worked out
    /// again each round from what validation left, so a transaction is
    /// never crowded out by one that does not make it into the block.
    fn screen(
        &self,
        chain: &ChainContext,
        block: &mut BlockTxs,
        header: &BlockHeader,
        outcome: &mut BlockOutcome,
    ) {
        let mut first_round = true;
        loop {
            let mut survivors = block.clone();
            let conflicts = self.detector.detect(chain, &survivors);
            survivors.remove(&conflicts.iter().map(|r| r.tx_hash).collect());
            if first_round {
                outcome.advance(BlockPhase::ConflictChecked);
                first_round = false;
            }
            let invalid = self.validate_all(chain, &survivors, header);
            if invalid.is_empty() {
                strip(block, conflicts, outcome);
                break;
            }
            strip(block, invalid, outcome);
        }
        outcome.advance(BlockPhase::Validated);
    }

    /// Run every type's `validate` on the worker pool. Results are merged
    /// in commit order so they do not depend on scheduling.
    fn validate_all(
        &self,
        chain: &ChainContext,
        block: &BlockTxs,
        header: &BlockHeader,
    ) -> Vec<Rejection> {
        let types = block.types_in_commit_order();
        let per_type: Vec<Vec<Rejection>> = self.pool.install(|| {
            types
                .par_iter()
                .map(|tx_type| {
                    let txs = block.of(*tx_type);
                    let _span = type_validate_span(*tx_type, txs.len()).entered();
                    match self.registry.get(*tx_type) {
                        Ok(processor) => processor.validate(chain, txs, block, Some(header)),
                        Err(e) => txs
                            .iter()
                            .map(|tx| Rejection::from_error(*tx.hash(), *tx_type, &e))
                            .collect(),
                    }
                })
                .collect()
        });
        per_type.into_iter().flatten().collect()
    }

    fn commit(
        &self,
        chain: &ChainContext,
        block: &BlockTxs,
        header: &BlockHeader,
        previous: Option<u64>,
        outcome: &mut BlockOutcome,
    ) -> Result<(), NodeError> {
        let mut journals: Vec<(TxType, Journal)> = Vec::new();
        for tx_type in block.types_in_commit_order() {
            let processor = self.registry.get(tx_type)?;
            let txs = block.of(tx_type);
            let span = type_commit_span(tx_type, txs.len());
            let _enter = span.enter();
            match processor.commit(chain, txs, header) {
                Ok(journal) => journals.push((tx_type, journal)),
                Err(e) if e.is_fatal() => return Err(corruption(chain, header, e)),
                Err(e) => {
                    tracing::warn!(
                        %tx_type,
                        code = %e.code(),
                        error = %e,
                        "type commit failed, rolling back block"
                    );
                    unwind_all(chain, header, journals)?;
                    outcome.failure = Some(BlockFailure {
                        tx_type,
                        code: e.code(),
                        reason: e.to_string(),
                    });
                    outcome.advance(BlockPhase::PartiallyCommittedThenRolledBack);
                    return Ok(());
                }
            }
        }

        let record = AppliedBlock::new(header.clone(), previous, block.iter_commit_order());
        if let Err(e) = applied::push(chain.store().as_ref(), &record) {
            tracing::warn!(error = %e, "could not record applied block, rolling back block");
            unwind_all(chain, header, journals)?;
            return Err(e.into());
        }

        outcome.committed = block.iter_commit_order().map(|tx| *tx.hash()).collect();
        outcome.advance(BlockPhase::Committed);
        Ok(())
    }

    /// Roll back the last applied block of `chain_id`, which must be at
    /// `height`. On failure the block's types already rolled back are
    /// committed again and the block stays applied.
    pub fn rollback_block(
        &mut self,
        chain_id: ChainId,
        height: u64,
    ) -> Result<AppliedBlock, NodeError> {
        let span = block_rollback_span(chain_id, height);
        let _enter = span.enter();

        let chain = self.engine.chain(chain_id)?;
        let store: &dyn KvStore = chain.store().as_ref();
        let last = applied::tip(store)?;
        if last != Some(height) {
            return Err(NodeError::NotTip {
                chain: chain_id,
                height,
                last,
            });
        }
        let record = applied::load(store, height)?.ok_or_else(|| NodeError::StateCorruption {
            chain: chain_id,
            height,
            reason: "applied block record is missing".to_string(),
        })?;
        let txs = record.transactions().map_err(|e| NodeError::StateCorruption {
            chain: chain_id,
            height,
            reason: format!("applied block record does not decode: {e}"),
        })?;
        let block = BlockTxs::new(txs);
        let header = &record.header;

        let mut journals: Vec<(TxType, Journal)> = Vec::new();
        for tx_type in block.types_in_commit_order().into_iter().rev() {
            let processor = self.registry.get(tx_type)?;
            let txs = block.of(tx_type);
            match processor.rollback(chain, txs, header) {
                Ok(journal) => journals.push((tx_type, journal)),
                Err(e) if e.is_fatal() => return Err(corruption(chain, header, e)),
                Err(e) => {
                    tracing::warn!(
                        %tx_type,
                        code = %e.code(),
                        error = %e,
                        "type rollback failed, re-applying block"
                    );
                    unwind_all(chain, header, journals)?;
                    return Err(NodeError::RollbackFailed {
                        chain: chain_id,
                        height,
                        tx_type,
                        source: e,
                    });
                }
            }
        }

        if let Err(e) = applied::pop(store, &record) {
            tracing::warn!(error = %e, "could not drop applied block record, re-applying block");
            unwind_all(chain, header, journals)?;
            return Err(e.into());
        }

        if let Some(metrics) = &self.metrics {
            metrics.blocks_rolled_back.inc();
        }
        tracing::info!(txs = record.tx_count(), "block rolled back");
        Ok(record)
    }

    /// Roll back the given applied blocks, highest first. Each must be the
    /// chain's last applied block when its turn comes.
    pub fn rollback_blocks(
        &mut self,
        chain_id: ChainId,
        heights: &[u64],
    ) -> Result<Vec<AppliedBlock>, NodeError> {
        let mut heights = heights.to_vec();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        heights
            .into_iter()
            .map(|height| self.rollback_block(chain_id, height))
            .collect()
    }

    /// Roll back every applied block above `height`.
    pub fn rollback_to(
        &mut self,
        chain_id: ChainId,
        height: u64,
    ) -> Result<Vec<AppliedBlock>, NodeError> {
        let mut rolled_back = Vec::new();
        while let Some(last) = self.last_applied(chain_id)? {
            if last <= height {
                break;
            }
            rolled_back.push(self.rollback_block(chain_id, last)?);
        }
        Ok(rolled_back)
    }
}

/// Remove `rejections` from `block`, keeping the first rejection of each
/// transaction. Returns how many transactions were removed.
fn strip(block: &mut BlockTxs, rejections: Vec<Rejection>, outcome: &mut BlockOutcome) {
    let mut hashes = HashSet::new();
    for rejection in rejections {
        if hashes.insert(rejection.tx_hash) {
            outcome.rejected.push(rejection);
        }
    }
    block.remove(&hashes);
}

/// Unwind type journals, last committed first.
fn unwind_all(
    chain: &ChainContext,
    header: &BlockHeader,
    journals: Vec<(TxType, Journal)>,
) -> Result<(), NodeError> {
    for (tx_type, journal) in journals.into_iter().rev() {
        tracing::debug!(%tx_type, changes = journal.len(), "unwinding type batch");
        journal.unwind(chain).map_err(|e| corruption(chain, header, e))?;
    }
    Ok(())
}

fn corruption(chain: &ChainContext, header: &BlockHeader, error: ProcessorError) -> NodeError {
    tracing::error!(
        chain = %chain.chain_id(),
        height = header.height,
        error = %error,
        "state corruption"
    );
    NodeError::StateCorruption {
        chain: chain.chain_id(),
        height: header.height,
        reason: error.to_string(),
    }
}
