//! Temporal sampler
//!
//! Snapshot `s` (0 = most recent) shifts every destination cutoff by
//! `s * snapshot_time_window` before each hop's window is computed, so older
//! snapshots see the same shifted horizon at every hop. Each snapshot's
//! chain of hops is independent of the others.

use super::config::{SamplerConfig, SamplingStrategy};
use super::layer::ComputationLayer;
use crate::graph::{DynamicGraph, TemporalNeighbors, Timestamp, VertexId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Errors raised by the temporal sampler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("Invalid batch shape: {0}")]
    InvalidBatchShape(String),

    #[error("Invalid sampler configuration: {0}")]
    Configuration(String),
}

pub type SamplerResult<T> = Result<T, SamplerError>;

/// Read-only multi-hop sampler over a dynamic graph
#[derive(Debug, Clone)]
pub struct TemporalSampler<'g> {
    graph: &'g DynamicGraph,
    config: SamplerConfig,
}

impl<'g> TemporalSampler<'g> {
    /// Create a sampler; fails on an invalid configuration
    pub fn new(graph: &'g DynamicGraph, config: SamplerConfig) -> SamplerResult<Self> {
        config.validate()?;
        Ok(Self { graph, config })
    }

    /// Single-snapshot, most-recent sampler
    pub fn with_fanouts(graph: &'g DynamicGraph, fanouts: Vec<usize>) -> SamplerResult<Self> {
        Self::new(graph, SamplerConfig::with_fanouts(fanouts))
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample every hop and snapshot for `roots` with per-root cutoffs.
    ///
    /// Returns `layers[layer][snapshot]`: layer 0 is the outermost hop and
    /// the last layer the hop adjacent to the roots; snapshot
    /// `num_snapshots - 1` is the most recent window.
    pub fn sample(
        &self,
        roots: &[VertexId],
        timestamps: &[Timestamp],
    ) -> SamplerResult<Vec<Vec<ComputationLayer>>> {
        if roots.len() != timestamps.len() {
            return Err(SamplerError::InvalidBatchShape(format!(
                "roots={}, timestamps={}",
                roots.len(),
                timestamps.len()
            )));
        }
        if let Some(i) = timestamps.iter().position(|t| t.is_nan()) {
            return Err(SamplerError::InvalidBatchShape(format!(
                "root timestamp at position {} is NaN",
                i
            )));
        }

        let num_layers = self.config.num_layers();
        let num_snapshots = self.config.num_snapshots;
        let mut layers: Vec<Vec<ComputationLayer>> = (0..num_layers)
            .map(|_| vec![ComputationLayer::default(); num_snapshots])
            .collect();

        for snapshot in 0..num_snapshots {
            let mut dst_ids = roots.to_vec();
            let mut dst_timestamps = timestamps.to_vec();
            for (hop, &fanout) in self.config.fanouts.iter().enumerate() {
                let layer = self.sample_layer(hop, snapshot, fanout, &dst_ids, &dst_timestamps);
                dst_ids = layer.sampled_node_ids().to_vec();
                dst_timestamps = layer.sampled_timestamps().to_vec();
                layers[num_layers - 1 - hop][num_snapshots - 1 - snapshot] = layer;
            }
        }

        debug!(
            "Sampled {} hops x {} snapshots for {} roots",
            num_layers,
            num_snapshots,
            roots.len()
        );
        Ok(layers)
    }

    /// Build one hop of one snapshot.
    ///
    /// `dst_timestamps` are unshifted cutoffs; the snapshot offset is applied
    /// here and the shifted values become the destination rows' timestamps.
    pub fn sample_layer(
        &self,
        hop: usize,
        snapshot: usize,
        fanout: usize,
        dst_ids: &[VertexId],
        dst_timestamps: &[Timestamp],
    ) -> ComputationLayer {
        let multi_snapshot = self.config.num_snapshots > 1;
        let window = self.config.snapshot_time_window;
        let offset = if multi_snapshot { snapshot as f64 * window } else { 0.0 };
        let cutoffs: Vec<Timestamp> = dst_timestamps.iter().map(|&t| t - offset).collect();

        let picks: Vec<TemporalNeighbors> = dst_ids
            .par_iter()
            .zip(cutoffs.par_iter())
            .enumerate()
            .map(|(row, (&vertex, &end))| {
                let start = if multi_snapshot { end - window } else { f64::NEG_INFINITY };
                self.pick(vertex, start, end, fanout, row_seed(self.config.seed, hop, snapshot, row))
            })
            .collect();

        let mut layer = ComputationLayer::with_destinations(dst_ids.to_vec(), cutoffs);
        for (row, picked) in picks.iter().enumerate() {
            let dst_timestamp = layer.node_timestamps[row];
            for (target, timestamp, edge_id) in picked.iter() {
                let src_timestamp = if self.config.prop_time { dst_timestamp } else { timestamp };
                layer.push_sampled(row, target, src_timestamp, dst_timestamp - src_timestamp, edge_id);
            }
        }
        layer
    }

    /// At most `fanout` neighbors of `vertex` in `[start, end]`, newest first
    fn pick(&self, vertex: VertexId, start: Timestamp, end: Timestamp, fanout: usize, seed: u64) -> TemporalNeighbors {
        match self.config.strategy {
            SamplingStrategy::Recent => self.graph.get_temporal_neighbors_limited(vertex, start, end, fanout),
            SamplingStrategy::Uniform => {
                let candidates = self.graph.get_temporal_neighbors(vertex, start, end);
                if candidates.len() <= fanout {
                    return candidates;
                }
                let mut rng = StdRng::seed_from_u64(seed);
                let mut chosen = rand::seq::index::sample(&mut rng, candidates.len(), fanout).into_vec();
                chosen.sort_unstable();

                let mut picked = TemporalNeighbors::with_capacity(fanout);
                for i in chosen {
                    picked.push(candidates.targets[i], candidates.timestamps[i], candidates.edge_ids[i]);
                }
                picked
            }
        }
    }
}

/// Per-row RNG seed so parallel scans stay reproducible
fn row_seed(seed: u64, hop: usize, snapshot: usize, row: usize) -> u64 {
    seed ^ ((hop as u64) << 56) ^ ((snapshot as u64) << 48) ^ row as u64
}
