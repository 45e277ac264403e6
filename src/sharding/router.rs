//! Batch router
//!
//! Splits each dataset batch into per-rank sub-batches. Dataset edge ids are
//! assigned here, in input order, so every rank that replays the same
//! stream agrees on them. A batch is placed on a copy of the partitioner and
//! the copy is kept only once every receiving rank has accepted its share.

use super::rank::{RankGraph, RankId};
use crate::graph::{batch, EdgeId, GraphError, Timestamp, VertexId};
use dyngraph_partition::{Partition, PartitionConfig, PartitionError, StreamingPartitioner};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while routing batches to ranks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShardError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Partition error: {0}")]
    Partition(#[from] PartitionError),

    #[error("Rank {rank} out of range for {num_ranks} ranks")]
    RankOutOfRange { rank: RankId, num_ranks: usize },
}

pub type ShardResult<T> = Result<T, ShardError>;

/// Routes a stream of batches to ranks with a streaming partitioner
#[derive(Debug, Clone)]
pub struct BatchRouter {
    partitioner: StreamingPartitioner,
    next_edge_id: EdgeId,
}

impl BatchRouter {
    pub fn new(config: PartitionConfig) -> ShardResult<Self> {
        Ok(Self {
            partitioner: StreamingPartitioner::new(config)?,
            next_edge_id: 0,
        })
    }

    pub fn num_ranks(&self) -> usize {
        self.partitioner.num_partitions()
    }

    pub fn partitioner(&self) -> &StreamingPartitioner {
        &self.partitioner
    }

    /// Dataset id the next routed edge will receive
    pub fn next_edge_id(&self) -> EdgeId {
        self.next_edge_id
    }

    /// Split a batch into one partition per rank.
    ///
    /// Edges are numbered from the router's running counter. No rank is
    /// involved, so the placements are committed at once.
    pub fn split(
        &mut self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> ShardResult<Vec<Partition>> {
        let plan = self.plan(sources, targets, timestamps)?;
        Ok(self.commit(plan))
    }

    /// Split a batch and ingest the share of `rank` only.
    ///
    /// The share is checked under the rank's write lock before the router
    /// commits its placements, so a rejected batch changes neither the rank
    /// nor the router. Returns the number of edges ingested locally.
    pub fn route_local(
        &mut self,
        rank: &RankGraph,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> ShardResult<usize> {
        let num_ranks = self.num_ranks();
        if rank.rank() >= num_ranks {
            return Err(ShardError::RankOutOfRange {
                rank: rank.rank(),
                num_ranks,
            });
        }

        let plan = self.plan(sources, targets, timestamps)?;
        let mut guard = rank.lock();
        let local = &plan.partitions[rank.rank()];
        if let Err(e) = guard.check_partition(local) {
            warn!("Rank {} rejected {} edges: {}", rank.rank(), local.len(), e);
            return Err(e.into());
        }
        guard.add_partition(local)?;
        let ingested = local.len();
        self.commit(plan);
        Ok(ingested)
    }

    /// Split a batch and ingest every share into its rank.
    ///
    /// `ranks[i]` must be rank `i`. All ranks are locked in rank order and
    /// every share is checked before any is ingested, so either the whole
    /// batch lands or nothing changes.
    pub fn route_all(
        &mut self,
        ranks: &[RankGraph],
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> ShardResult<Vec<usize>> {
        let num_ranks = self.num_ranks();
        if ranks.len() != num_ranks {
            return Err(ShardError::RankOutOfRange {
                rank: ranks.len(),
                num_ranks,
            });
        }
        if let Some((_, stray)) = ranks.iter().enumerate().find(|(i, r)| r.rank() != *i) {
            return Err(ShardError::RankOutOfRange {
                rank: stray.rank(),
                num_ranks,
            });
        }

        let plan = self.plan(sources, targets, timestamps)?;
        let mut guards: Vec<_> = ranks.iter().map(RankGraph::lock).collect();
        for (guard, share) in guards.iter().zip(&plan.partitions) {
            if let Err(e) = guard.check_partition(share) {
                warn!("Rank {} rejected {} edges: {}", guard.rank(), share.len(), e);
                return Err(e.into());
            }
        }
        for (guard, share) in guards.iter_mut().zip(&plan.partitions) {
            guard.add_partition(share)?;
        }
        drop(guards);

        let counts = plan.partitions.iter().map(Partition::len).collect();
        self.commit(plan);
        Ok(counts)
    }

    /// Partition a batch on a copy of the partitioner, leaving `self` untouched
    fn plan(
        &self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> ShardResult<RoutePlan> {
        let mut partitioner = self.partitioner.clone();
        if sources.is_empty() && targets.is_empty() && timestamps.is_empty() {
            return Ok(RoutePlan {
                partitions: vec![Partition::default(); self.num_ranks()],
                partitioner,
                num_edges: 0,
            });
        }
        batch::validate(sources, targets, timestamps)?;

        let first = self.next_edge_id;
        let edge_ids: Vec<EdgeId> = (first..first + sources.len() as EdgeId).collect();
        let partitions = partitioner.partition(sources, targets, timestamps, &edge_ids)?;
        Ok(RoutePlan {
            partitions,
            partitioner,
            num_edges: sources.len(),
        })
    }

    fn commit(&mut self, plan: RoutePlan) -> Vec<Partition> {
        let first = self.next_edge_id;
        self.partitioner = plan.partitioner;
        self.next_edge_id += plan.num_edges as EdgeId;
        debug!(
            "Routed edges {}..{} to {} ranks",
            first,
            self.next_edge_id,
            plan.partitions.len()
        );
        plan.partitions
    }
}

/// Placements computed for one batch, not yet visible in the router
struct RoutePlan {
    partitions: Vec<Partition>,
    partitioner: StreamingPartitioner,
    num_edges: usize,
}
