//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use strata_types::ChainConfig;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a strata node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Each `[[chains]]` table
/// configures one chain served by this node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Root directory; each chain gets its own LMDB environment below it.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Threads running per-type validation of a block.
    #[serde(default = "default_validation_workers")]
    pub validation_workers: usize,

    /// LMDB map size per chain, in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./strata_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_validation_workers() -> usize {
    4
}

fn default_map_size() -> usize {
    1 << 30
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and check configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject configurations the node cannot start with.
    pub fn check(&self) -> Result<(), NodeError> {
        if self.validation_workers == 0 {
            return Err(NodeError::Config(
                "validation_workers must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.chain_id) {
                return Err(NodeError::Config(format!(
                    "chain {} is configured twice",
                    chain.chain_id
                )));
            }
            chain.check().map_err(NodeError::Config)?;
        }
        Ok(())
    }

    /// LMDB directory of one chain.
    pub fn chain_dir(&self, chain: &ChainConfig) -> PathBuf {
        self.data_dir.join(format!("chain-{}", chain.chain_id))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            validation_workers: default_validation_workers(),
            lmdb_map_size: default_map_size(),
            chains: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::{Amount, ChainId};

    const ONE_CHAIN: &str = r#"
        data_dir = "/var/lib/strata"
        log_format = "json"
        validation_workers = 2

        [[chains]]
        chain_id = 1
        name = "main"
        append_min = "100"

        [chains.deposit]
        min = "1000"
        max = "5000"
    "#;

    #[test]
    fn default_config_round_trips_through_toml() {
        let mut config = NodeConfig::default();
        config.chains.push(ChainConfig::new(ChainId::new(7)));
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.validation_workers, config.validation_workers);
        assert_eq!(parsed.chains.len(), 1);
        assert_eq!(parsed.chains[0].deposit, config.chains[0].deposit);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.validation_workers, 4);
        assert!(config.chains.is_empty());
    }

    #[test]
    fn chain_tables_override_defaults() {
        let config = NodeConfig::from_toml_str(ONE_CHAIN).expect("should parse");
        assert_eq!(config.log_format, LogFormat::Json);
        let chain = &config.chains[0];
        assert_eq!(chain.chain_id, ChainId::new(1));
        assert_eq!(chain.deposit.max, Amount::from(5000u32));
        assert_eq!(chain.append_min, Amount::from(100u32));
        // default
        assert_eq!(chain.reduce_min, Amount::from(2000u32));
        assert_eq!(config.chain_dir(chain), PathBuf::from("/var/lib/strata/chain-1"));
    }

    #[test]
    fn duplicate_chain_is_rejected() {
        let toml = r#"
            [[chains]]
            chain_id = 3
            [[chains]]
            chain_id = 3
        "#;
        assert!(matches!(NodeConfig::from_toml_str(toml), Err(NodeError::Config(_))));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let toml = r#"
            [[chains]]
            chain_id = 3
            [chains.deposit]
            min = "9"
            max = "1"
        "#;
        assert!(matches!(NodeConfig::from_toml_str(toml), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file(Path::new("/nonexistent/strata.toml"));
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
