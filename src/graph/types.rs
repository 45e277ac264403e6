//! Core type definitions for the temporal graph

use serde::{Deserialize, Serialize};
use std::fmt;

pub use dyngraph_partition::common::{EdgeId, Timestamp, VertexId};

/// Index of a temporal block inside the block arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(usize);

impl BlockHandle {
    pub fn new(index: usize) -> Self {
        BlockHandle(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// Result of a temporal neighbor query, newest edge first.
///
/// The three sequences always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalNeighbors {
    pub targets: Vec<VertexId>,
    pub timestamps: Vec<Timestamp>,
    pub edge_ids: Vec<EdgeId>,
}

impl TemporalNeighbors {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            targets: Vec::with_capacity(capacity),
            timestamps: Vec::with_capacity(capacity),
            edge_ids: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, target: VertexId, timestamp: Timestamp, edge_id: EdgeId) {
        self.targets.push(target);
        self.timestamps.push(timestamp);
        self.edge_ids.push(edge_id);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Iterate `(target, timestamp, edge_id)` triples
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Timestamp, EdgeId)> + '_ {
        self.targets
            .iter()
            .zip(&self.timestamps)
            .zip(&self.edge_ids)
            .map(|((&t, &ts), &id)| (t, ts, id))
    }
}
