//! Prometheus metrics for the block commit orchestrator.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] so that an embedding
//! node can encode it into the Prometheus text exposition format next to
//! its own metrics.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks whose transactions were all committed.
    pub blocks_applied: IntCounter,
    /// Blocks whose commit failed and was rolled back.
    pub blocks_failed: IntCounter,
    /// Applied blocks later rolled back by a reorganization.
    pub blocks_rolled_back: IntCounter,
    pub txs_committed: IntCounter,
    /// Transactions removed by conflict detection or validation.
    pub txs_rejected: IntCounter,
    /// Rejections carrying `ConflictError`.
    pub conflicts: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent applying one block, in milliseconds.
    pub apply_time_ms: Histogram,
}

impl EngineMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let blocks_applied = register_int_counter_with_registry!(
            Opts::new("strata_blocks_applied_total", "Blocks fully committed"),
            registry
        )?;
        let blocks_failed = register_int_counter_with_registry!(
            Opts::new(
                "strata_blocks_failed_total",
                "Blocks whose commit failed and was rolled back"
            ),
            registry
        )?;
        let blocks_rolled_back = register_int_counter_with_registry!(
            Opts::new(
                "strata_blocks_rolled_back_total",
                "Applied blocks rolled back by a reorganization"
            ),
            registry
        )?;
        let txs_committed = register_int_counter_with_registry!(
            Opts::new("strata_txs_committed_total", "Transactions committed"),
            registry
        )?;
        let txs_rejected = register_int_counter_with_registry!(
            Opts::new(
                "strata_txs_rejected_total",
                "Transactions rejected by conflict detection or validation"
            ),
            registry
        )?;
        let conflicts = register_int_counter_with_registry!(
            Opts::new(
                "strata_conflicts_total",
                "Transactions rejected for an in-block conflict"
            ),
            registry
        )?;

        // Exponential buckets covering 0.1 ms to ~1.6 s.
        let buckets = prometheus::exponential_buckets(0.1, 2.0, 15)?;
        let apply_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "strata_block_apply_time_ms",
                "Block apply time in milliseconds"
            )
            .buckets(buckets),
            registry
        )?;

        Ok(Self {
            registry,
            blocks_applied,
            blocks_failed,
            blocks_rolled_back,
            txs_committed,
            txs_rejected,
            conflicts,
            apply_time_ms,
        })
    }

    /// Every metric in the text exposition format.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.blocks_applied.inc();
        metrics.txs_rejected.inc_by(3);
        let text = metrics.encode_text().unwrap();
        assert!(text.contains("strata_blocks_applied_total 1"));
        assert!(text.contains("strata_txs_rejected_total 3"));
    }
}
