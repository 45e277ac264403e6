//! Engine configuration
//!
//! Every setting of the store, the sampler and the partitioner is fixed at
//! construction time. `EngineConfig` bundles them so one YAML or JSON file
//! can describe a whole worker.

use crate::graph::{GraphConfig, GraphError};
use crate::sampler::{SamplerConfig, SamplerError};
use dyngraph_partition::{PartitionConfig, PartitionError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config file extension: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Partition(#[from] PartitionError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Store, sampler and partitioner settings of one worker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub graph: GraphConfig,
    pub sampler: SamplerConfig,
    pub partition: PartitionConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let text = fs::read_to_string(path)?;
        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text),
            "json" => Self::from_json_str(&text),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.graph.validate()?;
        self.sampler.validate()?;
        self.partition.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InsertionPolicy;
    use crate::sampler::SamplingStrategy;
    use dyngraph_partition::Strategy;
    use std::io::Write;

    const WORKER_YAML: &str = r#"
graph:
  block_size: 16
  insertion_policy: new
sampler:
  fanouts: [10, 5]
  num_snapshots: 3
  snapshot_time_window: 3600.0
  strategy: uniform
  seed: 42
partition:
  strategy: fennel_edge
  num_partitions: 4
"#;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.graph.block_size, 64);
        assert_eq!(config.sampler.fanouts, vec![10]);
        assert_eq!(config.partition.num_partitions, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let config = EngineConfig::from_yaml_str(WORKER_YAML).unwrap();
        assert_eq!(config.graph.block_size, 16);
        assert_eq!(config.graph.insertion_policy, InsertionPolicy::New);
        assert!(!config.graph.undirected);
        assert_eq!(config.sampler.fanouts, vec![10, 5]);
        assert_eq!(config.sampler.strategy, SamplingStrategy::Uniform);
        assert_eq!(config.sampler.seed, 42);
        assert_eq!(config.partition.strategy, Strategy::FennelEdge);
        assert_eq!(config.partition.num_partitions, 4);
        assert_eq!(config.partition.fennel_gamma, 1.5);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json_str(r#"{"partition": {"strategy": "ldg", "num_partitions": 2}}"#).unwrap();
        assert_eq!(config.partition.strategy, Strategy::Ldg);
        assert_eq!(config.graph, GraphConfig::default());
    }

    #[test]
    fn test_invalid_sections() {
        let err = EngineConfig::from_yaml_str("graph:\n  block_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Graph(GraphError::Configuration(_))));

        let err = EngineConfig::from_yaml_str("sampler:\n  num_snapshots: 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Sampler(SamplerError::Configuration(_))));

        let err = EngineConfig::from_json_str(r#"{"partition": {"num_partitions": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Partition(PartitionError::Configuration(_))));

        assert!(matches!(
            EngineConfig::from_yaml_str("partition:\n  strategy: metis\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("worker.yaml");
        let mut file = fs::File::create(&yaml_path).unwrap();
        file.write_all(WORKER_YAML.as_bytes()).unwrap();
        let from_yaml = EngineConfig::from_file(&yaml_path).unwrap();

        let json_path = dir.path().join("worker.json");
        fs::write(&json_path, serde_json::to_string(&from_yaml).unwrap()).unwrap();
        assert_eq!(EngineConfig::from_file(&json_path).unwrap(), from_yaml);

        let toml_path = dir.path().join("worker.toml");
        fs::write(&toml_path, "").unwrap();
        assert!(matches!(
            EngineConfig::from_file(&toml_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            EngineConfig::from_file(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
