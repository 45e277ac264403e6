//! Dynamic temporal graph storage
//!
//! This module implements the append-only temporal adjacency store:
//! - Validated ingestion batches
//! - Fixed-capacity temporal blocks chained per vertex, newest first
//! - Per-vertex monotonic ingestion and inclusive time-range queries

pub mod batch;
pub mod block;
pub mod config;
pub mod store;
pub mod types;

// Re-export main types
pub use batch::EdgeBatch;
pub use block::{BlockArena, BlockChain, TemporalBlock};
pub use config::{GraphConfig, InsertionPolicy};
pub use store::{DynamicGraph, GraphError, GraphResult};
pub use types::{BlockHandle, EdgeId, TemporalNeighbors, Timestamp, VertexId};
