//! Sampler configuration

use super::temporal::{SamplerError, SamplerResult};
use crate::graph::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which in-window neighbors are kept when more than `fanout` qualify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// The `fanout` most recent edges
    #[default]
    Recent,
    /// `fanout` edges drawn without replacement from a seeded RNG
    Uniform,
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingStrategy::Recent => write!(f, "recent"),
            SamplingStrategy::Uniform => write!(f, "uniform"),
        }
    }
}

impl FromStr for SamplingStrategy {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(SamplingStrategy::Recent),
            "uniform" => Ok(SamplingStrategy::Uniform),
            other => Err(SamplerError::Configuration(format!(
                "unknown sampling strategy '{}'",
                other
            ))),
        }
    }
}

/// Temporal sampler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Neighbor budget per hop; index 0 is the hop next to the roots
    pub fanouts: Vec<usize>,
    /// Number of snapshot windows
    pub num_snapshots: usize,
    /// Width of one snapshot window, required when `num_snapshots > 1`
    pub snapshot_time_window: Timestamp,
    pub strategy: SamplingStrategy,
    /// Give sampled rows their destination's timestamp instead of the edge's
    pub prop_time: bool,
    /// Seed for `SamplingStrategy::Uniform`
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fanouts: vec![10],
            num_snapshots: 1,
            snapshot_time_window: 0.0,
            strategy: SamplingStrategy::Recent,
            prop_time: false,
            seed: 0,
        }
    }
}

impl SamplerConfig {
    pub fn with_fanouts(fanouts: Vec<usize>) -> Self {
        Self {
            fanouts,
            ..Default::default()
        }
    }

    pub fn with_snapshots(fanouts: Vec<usize>, num_snapshots: usize, snapshot_time_window: Timestamp) -> Self {
        Self {
            fanouts,
            num_snapshots,
            snapshot_time_window,
            ..Default::default()
        }
    }

    pub fn num_layers(&self) -> usize {
        self.fanouts.len()
    }

    /// Validate configuration
    pub fn validate(&self) -> SamplerResult<()> {
        if self.fanouts.is_empty() {
            return Err(SamplerError::Configuration(
                "at least one fanout is required".to_string(),
            ));
        }
        if let Some(hop) = self.fanouts.iter().position(|&k| k == 0) {
            return Err(SamplerError::Configuration(format!(
                "fanout of hop {} must be positive",
                hop
            )));
        }
        if self.num_snapshots == 0 {
            return Err(SamplerError::Configuration(
                "num_snapshots must be at least 1".to_string(),
            ));
        }
        if self.num_snapshots > 1
            && !(self.snapshot_time_window.is_finite() && self.snapshot_time_window > 0.0)
        {
            return Err(SamplerError::Configuration(format!(
                "{} snapshots need a positive snapshot_time_window, got {}",
                self.num_snapshots, self.snapshot_time_window
            )));
        }
        Ok(())
    }
}
