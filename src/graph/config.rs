//! Store configuration

use super::store::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How equal timestamps across separate ingestion calls are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InsertionPolicy {
    /// Reject a batch whose timestamp ties the vertex's recorded maximum
    #[default]
    #[serde(rename = "default", alias = "strict")]
    Strict,
    /// Accept ties and order the new edges as more recent
    #[serde(rename = "new")]
    New,
}

impl InsertionPolicy {
    /// Whether an edge at `timestamp` may follow a recorded maximum of `max`
    pub fn accepts(&self, timestamp: f64, max: f64) -> bool {
        match self {
            InsertionPolicy::Strict => timestamp > max,
            InsertionPolicy::New => timestamp >= max,
        }
    }
}

impl fmt::Display for InsertionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertionPolicy::Strict => write!(f, "default"),
            InsertionPolicy::New => write!(f, "new"),
        }
    }
}

impl FromStr for InsertionPolicy {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" | "strict" => Ok(InsertionPolicy::Strict),
            "new" => Ok(InsertionPolicy::New),
            other => Err(GraphError::Configuration(format!(
                "unknown insertion policy '{}'",
                other
            ))),
        }
    }
}

/// Dynamic graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Edges per temporal block
    pub block_size: usize,
    /// Tie handling for timestamps equal to a vertex's maximum
    pub insertion_policy: InsertionPolicy,
    /// Also ingest every edge in the reverse direction
    pub undirected: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            block_size: 64,
            insertion_policy: InsertionPolicy::Strict,
            undirected: false,
        }
    }
}

impl GraphConfig {
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> GraphResult<()> {
        if self.block_size == 0 {
            return Err(GraphError::Configuration(
                "block_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_ties() {
        assert!(!InsertionPolicy::Strict.accepts(2.0, 2.0));
        assert!(InsertionPolicy::Strict.accepts(2.5, 2.0));
        assert!(InsertionPolicy::New.accepts(2.0, 2.0));
        assert!(!InsertionPolicy::New.accepts(1.0, 2.0));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("new".parse::<InsertionPolicy>().unwrap(), InsertionPolicy::New);
        assert_eq!("default".parse::<InsertionPolicy>().unwrap(), InsertionPolicy::Strict);
        assert_eq!(InsertionPolicy::New.to_string(), "new");
        assert!("latest".parse::<InsertionPolicy>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(GraphConfig::default().validate().is_ok());
        assert!(matches!(
            GraphConfig::with_block_size(0).validate(),
            Err(GraphError::Configuration(_))
        ));
    }
}
