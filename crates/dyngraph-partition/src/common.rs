//! Shared identifiers and the per-partition edge subset

/// Vertex identifier (dense, non-negative)
pub type VertexId = u64;

/// Globally unique edge identifier
pub type EdgeId = u64;

/// Edge timestamp
pub type Timestamp = f64;

/// Partition identifier as stored in the partition table
pub type PartitionId = i32;

/// The edges of one batch routed to a single partition, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    pub sources: Vec<VertexId>,
    pub targets: Vec<VertexId>,
    pub timestamps: Vec<Timestamp>,
    pub edge_ids: Vec<EdgeId>,
}

impl Partition {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sources: Vec::with_capacity(capacity),
            targets: Vec::with_capacity(capacity),
            timestamps: Vec::with_capacity(capacity),
            edge_ids: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, source: VertexId, target: VertexId, timestamp: Timestamp, edge_id: EdgeId) {
        self.sources.push(source);
        self.targets.push(target);
        self.timestamps.push(timestamp);
        self.edge_ids.push(edge_id);
    }

    /// Number of edges routed to this partition
    pub fn len(&self) -> usize {
        self.edge_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_ids.is_empty()
    }
}
