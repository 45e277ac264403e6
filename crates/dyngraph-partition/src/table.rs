//! Dense vertex -> partition table

use crate::common::{PartitionId, VertexId};

/// Sentinel for a vertex that has not been assigned yet
pub const UNASSIGNED: PartitionId = -1;

/// Dense array mapping vertex index to partition id.
///
/// The table only grows. Once a slot holds a partition id it is never
/// overwritten.
#[derive(Debug, Clone, Default)]
pub struct PartitionTable {
    slots: Vec<PartitionId>,
}

impl PartitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dense slots needed to hold `vertex`; `None` past the address space
    pub fn slots_for(vertex: VertexId) -> Option<usize> {
        usize::try_from(vertex).ok()?.checked_add(1)
    }

    /// Grow the table so that `vertex` has a slot, filling with `UNASSIGNED`.
    ///
    /// Returns `false` if `vertex` cannot be indexed.
    pub fn ensure_vertex(&mut self, vertex: VertexId) -> bool {
        let Some(needed) = Self::slots_for(vertex) else {
            return false;
        };
        if needed > self.slots.len() {
            self.slots.resize(needed, UNASSIGNED);
        }
        true
    }

    /// Partition of `vertex`, `None` when unassigned or beyond the table
    pub fn get(&self, vertex: VertexId) -> Option<usize> {
        match self.slots.get(vertex as usize) {
            Some(&p) if p != UNASSIGNED => Some(p as usize),
            _ => None,
        }
    }

    pub fn is_assigned(&self, vertex: VertexId) -> bool {
        self.get(vertex).is_some()
    }

    /// Record the assignment of an unassigned vertex.
    ///
    /// Returns `false` and leaves the table untouched if the vertex already
    /// has a partition or cannot be indexed.
    pub fn assign(&mut self, vertex: VertexId, partition: usize) -> bool {
        if !self.ensure_vertex(vertex) {
            return false;
        }
        let slot = &mut self.slots[vertex as usize];
        if *slot != UNASSIGNED {
            return false;
        }
        *slot = partition as PartitionId;
        true
    }

    /// Full table including unassigned slots
    pub fn as_slice(&self) -> &[PartitionId] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of vertices holding a partition id
    pub fn num_assigned(&self) -> usize {
        self.slots.iter().filter(|&&p| p != UNASSIGNED).count()
    }
}
