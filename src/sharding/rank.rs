//! One rank's shared graph handle

use crate::graph::{DynamicGraph, GraphConfig, GraphResult, Timestamp, VertexId};
use dyngraph_partition::Partition;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use tracing::info;

/// Worker rank index
pub type RankId = usize;

/// The graph store of a single rank.
///
/// Clones share the same store. A batch is applied under one write lock,
/// so samplers holding a read guard never observe half of a batch.
#[derive(Debug, Clone)]
pub struct RankGraph {
    rank: RankId,
    graph: Arc<RwLock<DynamicGraph>>,
}

impl RankGraph {
    pub fn new(rank: RankId, config: GraphConfig) -> GraphResult<Self> {
        Ok(Self {
            rank,
            graph: Arc::new(RwLock::new(DynamicGraph::new(config)?)),
        })
    }

    pub fn rank(&self) -> RankId {
        self.rank
    }

    /// Ingest a batch into this rank's store
    pub fn add_edges(
        &self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> GraphResult<()> {
        self.lock().add_edges(sources, targets, timestamps)
    }

    /// Ingest the edges the partitioner routed to this rank
    pub fn add_partition(&self, partition: &Partition) -> GraphResult<()> {
        self.lock().add_partition(partition)
    }

    /// Exclusive access held across a check and the ingestion that follows it
    pub fn lock(&self) -> RankWriteGuard<'_> {
        RankWriteGuard {
            rank: self.rank,
            graph: self.graph.write(),
        }
    }

    /// Shared read access for queries and sampling
    pub fn read(&self) -> RwLockReadGuard<'_, DynamicGraph> {
        self.graph.read()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.read().num_edges()
    }
}

/// Write access to one rank's store
pub struct RankWriteGuard<'a> {
    rank: RankId,
    graph: RwLockWriteGuard<'a, DynamicGraph>,
}

impl RankWriteGuard<'_> {
    pub fn rank(&self) -> RankId {
        self.rank
    }

    /// Whether `partition` would be accepted; empty shares always are
    pub fn check_partition(&self, partition: &Partition) -> GraphResult<()> {
        if partition.is_empty() {
            return Ok(());
        }
        self.graph
            .check_batch(&partition.sources, &partition.targets, &partition.timestamps)
    }

    pub fn add_edges(
        &mut self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> GraphResult<()> {
        info!("Rank {}: Adding {} edges.", self.rank, sources.len());
        self.graph.add_edges(sources, targets, timestamps)
    }

    /// Ingest a routed share; empty shares are skipped
    pub fn add_partition(&mut self, partition: &Partition) -> GraphResult<()> {
        if partition.is_empty() {
            return Ok(());
        }
        self.add_edges(&partition.sources, &partition.targets, &partition.timestamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphError;
    use std::thread;

    #[test]
    fn test_clones_share_store() {
        let rank = RankGraph::new(3, GraphConfig::with_block_size(2)).unwrap();
        let other = rank.clone();
        rank.add_edges(&[0, 0, 1], &[1, 2, 0], &[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(other.rank(), 3);
        assert_eq!(other.num_edges(), 3);
        assert_eq!(other.read().out_degree(0), 2);
    }

    #[test]
    fn test_rejected_batch_leaves_store_unchanged() {
        let rank = RankGraph::new(0, GraphConfig::default()).unwrap();
        rank.add_edges(&[0], &[1], &[5.0]).unwrap();
        let err = rank.add_edges(&[0, 2], &[1, 3], &[4.0, 9.0]).unwrap_err();
        assert!(matches!(err, GraphError::OutOfOrderTimestamp { vertex: 0, .. }));
        assert_eq!(rank.num_edges(), 1);
        assert_eq!(rank.read().out_degree(2), 0);
    }

    #[test]
    fn test_concurrent_readers() {
        let rank = RankGraph::new(0, GraphConfig::with_block_size(4)).unwrap();
        let writer = rank.clone();
        let handle = thread::spawn(move || {
            for step in 0..50u64 {
                let t = step as f64;
                writer.add_edges(&[0, 0], &[1, 2], &[t, t]).unwrap();
            }
        });
        for _ in 0..50 {
            let graph = rank.read();
            // Batches are whole: the degree is always even
            assert_eq!(graph.out_degree(0) % 2, 0);
        }
        handle.join().unwrap();
        assert_eq!(rank.num_edges(), 100);
    }
}
