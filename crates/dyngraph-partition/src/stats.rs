//! Balance and edge-cut measurements

use crate::common::{PartitionId, VertexId};
use crate::table::UNASSIGNED;

/// Per-partition load snapshot
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionStats {
    /// Assigned vertices per partition
    pub vertex_counts: Vec<usize>,
    /// Routed edges per partition
    pub edge_counts: Vec<usize>,
}

impl PartitionStats {
    pub fn new(vertex_counts: Vec<usize>, edge_counts: Vec<usize>) -> Self {
        Self {
            vertex_counts,
            edge_counts,
        }
    }

    /// Largest over smallest vertex count; an empty partition counts as 1
    pub fn load_factor(&self) -> f64 {
        let max = self.vertex_counts.iter().copied().max().unwrap_or(0);
        let min = self.vertex_counts.iter().copied().min().unwrap_or(0).max(1);
        max as f64 / min as f64
    }

    pub fn total_vertices(&self) -> usize {
        self.vertex_counts.iter().sum()
    }

    pub fn total_edges(&self) -> usize {
        self.edge_counts.iter().sum()
    }
}

/// Number of edges whose endpoints are both assigned and disagree.
///
/// Endpoints beyond the table or still unassigned do not count as cut.
pub fn edge_cut(table: &[PartitionId], sources: &[VertexId], targets: &[VertexId]) -> usize {
    let lookup = |v: VertexId| match table.get(v as usize) {
        Some(&p) if p != UNASSIGNED => Some(p),
        _ => None,
    };
    sources
        .iter()
        .zip(targets)
        .filter(|&(&s, &t)| matches!((lookup(s), lookup(t)), (Some(a), Some(b)) if a != b))
        .count()
}
