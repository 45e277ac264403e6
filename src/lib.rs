//! Dyngraph
//!
//! Temporal graph storage and sampling for continuous-time dynamic graph
//! learning on streams of timestamped edges.
//!
//! # Components
//!
//! - `graph`: append-only dynamic graph store. Each vertex keeps its edges in
//!   a chain of fixed-size temporal blocks, newest first, so time-range
//!   queries stop early.
//! - `sampler`: multi-hop, multi-snapshot temporal neighbor sampling that
//!   produces per-hop computation layers with time deltas.
//! - `sharding`: per-rank graph handles and a batch router driven by the
//!   streaming partitioner in `dyngraph-partition` (hash, LDG, Fennel and
//!   edge-balanced Fennel).
//! - `config`: YAML/JSON loading for every constructor-time setting.
//!
//! ## Example Usage
//!
//! ```rust
//! use dyngraph::graph::DynamicGraph;
//! use dyngraph::sampler::{SamplerConfig, TemporalSampler};
//!
//! let mut graph = DynamicGraph::with_block_size(64).unwrap();
//! graph.add_edges(&[0, 0, 1], &[1, 2, 2], &[1.0, 2.0, 3.0]).unwrap();
//!
//! // Edges of vertex 0 in [0, 10], newest first
//! let neighbors = graph.get_temporal_neighbors(0, 0.0, 10.0);
//! assert_eq!(neighbors.targets, vec![2, 1]);
//!
//! // Two hops, up to 2 neighbors each
//! let sampler = TemporalSampler::new(&graph, SamplerConfig::with_fanouts(vec![2, 2])).unwrap();
//! let layers = sampler.sample(&[0], &[10.0]).unwrap();
//! assert_eq!(layers.len(), 2);
//! assert_eq!(layers[1][0].num_edges(), 2);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod graph;
pub mod sampler;
pub mod sharding;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, EngineConfig};

pub use graph::{
    DynamicGraph, EdgeBatch, EdgeId, GraphConfig, GraphError, GraphResult, InsertionPolicy,
    TemporalNeighbors, Timestamp, VertexId,
};

pub use sampler::{
    ComputationLayer, SamplerConfig, SamplerError, SamplerResult, SamplingStrategy,
    TemporalSampler,
};

pub use sharding::{BatchRouter, RankGraph, RankId, ShardError, ShardResult};

pub use dyngraph_partition::{
    edge_cut, Partition, PartitionConfig, PartitionError, PartitionId, PartitionStats,
    PartitionTable, Strategy, StreamingPartitioner, UNASSIGNED,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
