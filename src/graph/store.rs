//! In-memory dynamic graph store
//!
//! Edges arrive in batches and are never updated or removed. Every vertex
//! owns a stack of temporal blocks whose head holds its most recent edges,
//! so range queries are a newest-first scan that stops as soon as the
//! blocks fall below the requested start time.

use super::batch::{self, EdgeBatch};
use super::block::{BlockArena, TemporalBlock};
use super::config::{GraphConfig, InsertionPolicy};
use super::types::{BlockHandle, EdgeId, TemporalNeighbors, Timestamp, VertexId};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::mem;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Out-of-order timestamp for vertex {vertex}: {timestamp} does not follow {max_timestamp}")]
    OutOfOrderTimestamp {
        vertex: VertexId,
        timestamp: Timestamp,
        max_timestamp: Timestamp,
    },

    #[error("Invalid batch shape: {0}")]
    InvalidBatchShape(String),

    #[error("Invalid graph configuration: {0}")]
    Configuration(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Per-vertex chain metadata
#[derive(Debug, Clone, Copy, Default)]
struct VertexState {
    head: Option<BlockHandle>,
    degree: usize,
    num_blocks: usize,
    max_timestamp: Option<Timestamp>,
}

/// Append-only temporal graph
///
/// - vertices: dense vertex id -> chain head, degree and max timestamp
/// - arena: every temporal block, addressed by `BlockHandle`
#[derive(Debug, Clone)]
pub struct DynamicGraph {
    config: GraphConfig,
    arena: BlockArena,
    vertices: Vec<VertexState>,
    num_edges: usize,
    next_edge_id: EdgeId,
}

impl DynamicGraph {
    /// Create an empty graph; fails on an invalid configuration
    pub fn new(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        Ok(DynamicGraph {
            config,
            arena: BlockArena::new(),
            vertices: Vec::new(),
            num_edges: 0,
            next_edge_id: 0,
        })
    }

    /// Create an empty graph with the default policy and `block_size`
    pub fn with_block_size(block_size: usize) -> GraphResult<Self> {
        Self::new(GraphConfig::with_block_size(block_size))
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Ingest a batch given as three parallel slices.
    ///
    /// Edges are grouped by source vertex (ascending), sorted by timestamp
    /// inside each group (stable), and numbered in that order from the
    /// running edge id counter. The whole batch is rejected, with no
    /// visible mutation, if any vertex would go back in time.
    pub fn add_edges(
        &mut self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> GraphResult<()> {
        batch::validate(sources, targets, timestamps)?;
        let (sources, targets, timestamps) = self.directed(sources, targets, timestamps);
        self.check_order(&sources, &timestamps)?;
        self.ingest(&sources, &targets, &timestamps)
    }

    /// Run every check `add_edges` would run, without ingesting anything
    pub fn check_batch(
        &self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> GraphResult<()> {
        batch::validate(sources, targets, timestamps)?;
        let (sources, _, timestamps) = self.directed(sources, targets, timestamps);
        self.check_order(&sources, &timestamps)
    }

    /// The edges actually stored: undirected graphs also keep every reverse edge
    fn directed<'a>(
        &self,
        sources: &'a [VertexId],
        targets: &'a [VertexId],
        timestamps: &'a [Timestamp],
    ) -> (Cow<'a, [VertexId]>, Cow<'a, [VertexId]>, Cow<'a, [Timestamp]>) {
        if self.config.undirected {
            (
                Cow::Owned([sources, targets].concat()),
                Cow::Owned([targets, sources].concat()),
                Cow::Owned([timestamps, timestamps].concat()),
            )
        } else {
            (Cow::Borrowed(sources), Cow::Borrowed(targets), Cow::Borrowed(timestamps))
        }
    }

    /// Reject the batch if any source's earliest edge breaks the insertion policy.
    ///
    /// Sources are checked in ascending id order.
    fn check_order(&self, sources: &[VertexId], timestamps: &[Timestamp]) -> GraphResult<()> {
        let mut earliest: BTreeMap<VertexId, Timestamp> = BTreeMap::new();
        for (&vertex, &ts) in sources.iter().zip(timestamps) {
            earliest
                .entry(vertex)
                .and_modify(|e| {
                    if ts.total_cmp(e).is_lt() {
                        *e = ts;
                    }
                })
                .or_insert(ts);
        }

        for (vertex, earliest) in earliest {
            if let Some(max) = self.max_timestamp(vertex) {
                if !self.config.insertion_policy.accepts(earliest, max) {
                    warn!(
                        "Rejecting batch of {} edges: vertex {} has timestamp {} but already reached {}",
                        sources.len(),
                        vertex,
                        earliest,
                        max
                    );
                    return Err(GraphError::OutOfOrderTimestamp {
                        vertex,
                        timestamp: earliest,
                        max_timestamp: max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Ingest a validated batch
    pub fn add_batch(&mut self, batch: &EdgeBatch) -> GraphResult<()> {
        self.add_edges(batch.sources(), batch.targets(), batch.timestamps())
    }

    fn ingest(
        &mut self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) -> GraphResult<()> {
        let mut order: Vec<usize> = (0..sources.len()).collect();
        order.sort_by(|&a, &b| {
            sources[a]
                .cmp(&sources[b])
                .then_with(|| timestamps[a].total_cmp(&timestamps[b]))
        });
        let groups: Vec<&[usize]> = order
            .chunk_by(|&a, &b| sources[a] == sources[b])
            .collect();

        let max_vertex = sources.iter().chain(targets).copied().max().unwrap_or(0);
        let needed = batch::slots_for(max_vertex).ok_or_else(|| {
            GraphError::InvalidBatchShape(format!(
                "vertex id {} exceeds the addressable range",
                max_vertex
            ))
        })?;
        if needed > self.vertices.len() {
            self.vertices.resize(needed, VertexState::default());
        }

        let blocks_before = self.arena.len();
        for group in &groups {
            self.append_group(group, sources[group[0]], targets, timestamps);
        }
        self.num_edges += sources.len();

        debug!(
            "Ingested {} edges for {} source vertices into {} new blocks",
            sources.len(),
            groups.len(),
            self.arena.len() - blocks_before
        );
        Ok(())
    }

    /// Push one vertex's group (ascending timestamps) as new head blocks.
    ///
    /// The oldest chunk links to the existing chain and the newest chunk
    /// becomes the head; each block stores its entries newest first.
    fn append_group(
        &mut self,
        group: &[usize],
        vertex: VertexId,
        targets: &[VertexId],
        timestamps: &[Timestamp],
    ) {
        let block_size = self.config.block_size;
        let first_id = self.next_edge_id;
        let mut state = self.vertices[vertex as usize];

        for (chunk_idx, chunk) in group.chunks(block_size).enumerate() {
            let chunk_first_id = first_id + (chunk_idx * block_size) as EdgeId;
            let mut block = TemporalBlock::new(chunk.len(), state.head);
            for (offset, &i) in chunk.iter().enumerate().rev() {
                block.push_older(targets[i], timestamps[i], chunk_first_id + offset as EdgeId);
            }
            state.head = Some(self.arena.insert(block));
            state.num_blocks += 1;
        }

        state.degree += group.len();
        state.max_timestamp = Some(timestamps[group[group.len() - 1]]);
        self.vertices[vertex as usize] = state;
        self.next_edge_id += group.len() as EdgeId;
    }

    /// Edges of `vertex` with `start_timestamp <= ts <= end_timestamp`, newest first.
    ///
    /// Unknown vertices yield an empty result.
    pub fn get_temporal_neighbors(
        &self,
        vertex: VertexId,
        start_timestamp: Timestamp,
        end_timestamp: Timestamp,
    ) -> TemporalNeighbors {
        self.scan(vertex, start_timestamp, end_timestamp, usize::MAX)
    }

    /// Every edge of `vertex`, newest first
    pub fn get_all_temporal_neighbors(&self, vertex: VertexId) -> TemporalNeighbors {
        self.scan(vertex, f64::NEG_INFINITY, f64::INFINITY, usize::MAX)
    }

    /// Like `get_temporal_neighbors` but stops after the `limit` newest matches
    pub fn get_temporal_neighbors_limited(
        &self,
        vertex: VertexId,
        start_timestamp: Timestamp,
        end_timestamp: Timestamp,
        limit: usize,
    ) -> TemporalNeighbors {
        self.scan(vertex, start_timestamp, end_timestamp, limit)
    }

    fn scan(&self, vertex: VertexId, start: Timestamp, end: Timestamp, limit: usize) -> TemporalNeighbors {
        let state = match self.vertices.get(vertex as usize) {
            Some(state) if state.head.is_some() => state,
            _ => return TemporalNeighbors::default(),
        };
        if limit == 0 || start.is_nan() || end.is_nan() || start > end {
            return TemporalNeighbors::default();
        }

        let mut out = TemporalNeighbors::with_capacity(state.degree.min(limit));
        for block in self.arena.chain(state.head) {
            match (block.max_timestamp(), block.min_timestamp()) {
                // Every remaining block is older still
                (Some(newest), _) if newest < start => break,
                (_, Some(oldest)) if oldest > end => continue,
                _ => {}
            }
            for i in block.range(start, end) {
                out.push(block.targets()[i], block.timestamps()[i], block.edge_ids()[i]);
                if out.len() == limit {
                    return out;
                }
            }
        }
        out
    }

    /// Number of edges ever ingested with `vertex` as source
    pub fn out_degree(&self, vertex: VertexId) -> usize {
        self.vertices
            .get(vertex as usize)
            .map_or(0, |state| state.degree)
    }

    /// Largest timestamp ingested for `vertex` as source
    pub fn max_timestamp(&self, vertex: VertexId) -> Option<Timestamp> {
        self.vertices
            .get(vertex as usize)
            .and_then(|state| state.max_timestamp)
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// One past the largest vertex id seen as either endpoint
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// The id the next ingested edge will receive
    pub fn next_edge_id(&self) -> EdgeId {
        self.next_edge_id
    }

    /// Vertices with at least one outgoing edge, ascending
    pub fn source_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, state)| state.degree > 0)
            .map(|(v, _)| v as VertexId)
    }

    pub fn num_source_vertices(&self) -> usize {
        self.vertices.iter().filter(|state| state.degree > 0).count()
    }

    pub fn num_blocks(&self) -> usize {
        self.arena.len()
    }

    /// Number of blocks chained under `vertex`
    pub fn num_blocks_of(&self, vertex: VertexId) -> usize {
        self.vertices
            .get(vertex as usize)
            .map_or(0, |state| state.num_blocks)
    }

    /// Mean chain length over vertices that own at least one block
    pub fn avg_linked_list_length(&self) -> f64 {
        let sources = self.num_source_vertices();
        if sources == 0 {
            return 0.0;
        }
        self.arena.len() as f64 / sources as f64
    }

    /// Bytes held by block storage
    pub fn memory_usage(&self) -> usize {
        self.arena.memory_usage()
    }

    /// Bytes held by the per-vertex table
    pub fn metadata_memory_usage(&self) -> usize {
        self.vertices.capacity() * mem::size_of::<VertexState>()
    }

    pub fn insertion_policy(&self) -> InsertionPolicy {
        self.config.insertion_policy
    }

    /// Drop every vertex, block and edge; the edge id counter restarts at 0
    pub fn clear(&mut self) {
        self.arena.clear();
        self.vertices.clear();
        self.num_edges = 0;
        self.next_edge_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(block_size: usize) -> DynamicGraph {
        DynamicGraph::with_block_size(block_size).unwrap()
    }

    #[test]
    fn test_add_edges_for_one_vertex() {
        let mut g = graph(1);
        g.add_edges(&[0, 0, 0], &[1, 2, 3], &[0.0, 1.0, 2.0]).unwrap();

        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.out_degree(0), 3);
        assert_eq!(g.num_blocks_of(0), 3);

        let n = g.get_all_temporal_neighbors(0);
        assert_eq!(n.targets, vec![3, 2, 1]);
        assert_eq!(n.timestamps, vec![2.0, 1.0, 0.0]);
        assert_eq!(n.edge_ids, vec![2, 1, 0]);
    }

    #[test]
    fn test_duplicate_edges_are_kept() {
        let mut g = graph(1);
        g.add_edges(&[0, 0, 0, 0], &[1, 2, 3, 2], &[0.0, 1.0, 2.0, 3.0]).unwrap();

        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.num_vertices(), 4);
        let n = g.get_all_temporal_neighbors(0);
        assert_eq!(n.targets, vec![2, 3, 2, 1]);
        assert_eq!(n.edge_ids, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_blocks_split_oldest_first() {
        let mut g = graph(2);
        g.add_edges(&[0, 0, 0], &[1, 2, 3], &[0.0, 1.0, 2.0]).unwrap();

        // Chunks [t0, t1] then [t2]; the newest chunk is the head
        assert_eq!(g.num_blocks_of(0), 2);
        let n = g.get_all_temporal_neighbors(0);
        assert_eq!(n.timestamps, vec![2.0, 1.0, 0.0]);
        assert_eq!(n.edge_ids, vec![2, 1, 0]);
    }

    #[test]
    fn test_rejected_batch_changes_nothing() {
        let mut g = graph(1);
        g.add_edges(&[0, 1, 2], &[1, 2, 3], &[0.0, 1.0, 2.0]).unwrap();

        // Vertex 3 is fine, vertex 0 goes back in time
        let err = g.add_edges(&[3, 0], &[9, 1], &[5.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            GraphError::OutOfOrderTimestamp {
                vertex: 0,
                timestamp: 0.0,
                max_timestamp: 0.0
            }
        );
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.out_degree(3), 0);
        assert_eq!(g.next_edge_id(), 3);
    }

    #[test]
    fn test_new_policy_orders_ties_as_newer() {
        let mut g = DynamicGraph::new(GraphConfig {
            block_size: 4,
            insertion_policy: InsertionPolicy::New,
            undirected: false,
        })
        .unwrap();
        g.add_edges(&[0, 0], &[1, 2], &[1.0, 2.0]).unwrap();
        g.add_edges(&[0], &[3], &[2.0]).unwrap();

        let n = g.get_all_temporal_neighbors(0);
        assert_eq!(n.targets, vec![3, 2, 1]);
        assert_eq!(n.edge_ids, vec![2, 1, 0]);
        assert!(g.add_edges(&[0], &[4], &[1.5]).is_err());

        let mut strict = graph(4);
        strict.add_edges(&[0, 0], &[1, 2], &[1.0, 2.0]).unwrap();
        assert!(matches!(
            strict.add_edges(&[0], &[3], &[2.0]),
            Err(GraphError::OutOfOrderTimestamp { .. })
        ));
    }

    #[test]
    fn test_undirected_ingests_reverse_edges() {
        let mut g = DynamicGraph::new(GraphConfig {
            undirected: true,
            ..GraphConfig::with_block_size(8)
        })
        .unwrap();
        g.add_edges(&[0, 1], &[1, 2], &[0.0, 1.0]).unwrap();

        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.out_degree(1), 2);
        let n = g.get_all_temporal_neighbors(1);
        assert_eq!(n.targets, vec![2, 0]);
        // Vertex 0 gets id 0, vertex 1 ids 1 and 2, vertex 2 id 3
        assert_eq!(n.edge_ids, vec![2, 1]);
        assert_eq!(g.get_all_temporal_neighbors(2).edge_ids, vec![3]);
    }

    #[test]
    fn test_limited_scan() {
        let mut g = graph(2);
        g.add_edges(&[0; 5], &[1, 2, 3, 4, 5], &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();

        let n = g.get_temporal_neighbors_limited(0, f64::NEG_INFINITY, 3.5, 2);
        assert_eq!(n.targets, vec![4, 3]);
        assert!(g.get_temporal_neighbors_limited(0, 0.0, 4.0, 0).is_empty());
    }

    #[test]
    fn test_unknown_vertex_and_inverted_range() {
        let mut g = graph(1);
        g.add_edges(&[0], &[1], &[0.0]).unwrap();
        assert!(g.get_all_temporal_neighbors(42).is_empty());
        assert!(g.get_all_temporal_neighbors(1).is_empty());
        assert!(g.get_temporal_neighbors(0, 1.0, 0.0).is_empty());
        assert_eq!(g.out_degree(42), 0);
        assert_eq!(g.max_timestamp(42), None);
    }

    #[test]
    fn test_introspection_and_clear() {
        let mut g = graph(2);
        g.add_edges(&[0, 0, 0, 2], &[1, 2, 3, 0], &[0.0, 1.0, 2.0, 0.0]).unwrap();

        assert_eq!(g.source_vertices().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(g.num_source_vertices(), 2);
        assert_eq!(g.num_blocks(), 3);
        assert_eq!(g.avg_linked_list_length(), 1.5);
        assert_eq!(g.max_timestamp(0), Some(2.0));
        assert!(g.memory_usage() > 0);
        assert!(g.metadata_memory_usage() > 0);

        g.clear();
        assert_eq!(g.num_edges(), 0);
        assert_eq!(g.num_vertices(), 0);
        assert_eq!(g.next_edge_id(), 0);
        assert!(g.get_all_temporal_neighbors(0).is_empty());
    }

    #[test]
    fn test_invalid_config_and_batch() {
        assert!(matches!(
            DynamicGraph::with_block_size(0),
            Err(GraphError::Configuration(_))
        ));
        let mut g = graph(1);
        assert!(matches!(
            g.add_edges(&[], &[], &[]),
            Err(GraphError::InvalidBatchShape(_))
        ));
        assert!(matches!(
            g.add_edges(&[0, 1], &[1, 2], &[0.0]),
            Err(GraphError::InvalidBatchShape(_))
        ));
        assert!(matches!(
            g.add_edges(&[u64::MAX], &[0], &[1.0]),
            Err(GraphError::InvalidBatchShape(_))
        ));
        assert!(matches!(
            g.add_edges(&[0], &[u64::MAX], &[1.0]),
            Err(GraphError::InvalidBatchShape(_))
        ));
        assert_eq!(g.num_vertices(), 0);
    }

    #[test]
    fn test_check_batch_is_a_dry_run() {
        let mut g = graph(2);
        g.add_edges(&[0, 1], &[1, 0], &[5.0, 5.0]).unwrap();

        assert!(g.check_batch(&[0, 7], &[2, 8], &[6.0, 1.0]).is_ok());
        assert_eq!(
            g.check_batch(&[7, 0], &[8, 1], &[9.0, 1.0]),
            Err(GraphError::OutOfOrderTimestamp {
                vertex: 0,
                timestamp: 1.0,
                max_timestamp: 5.0
            })
        );
        assert!(matches!(
            g.check_batch(&[0], &[1, 2], &[6.0]),
            Err(GraphError::InvalidBatchShape(_))
        ));
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.num_vertices(), 2);
        assert_eq!(g.next_edge_id(), 2);
    }

    #[test]
    fn test_check_batch_sees_reverse_edges() {
        let mut g = DynamicGraph::new(GraphConfig {
            undirected: true,
            ..GraphConfig::with_block_size(2)
        })
        .unwrap();
        g.add_edges(&[0], &[1], &[5.0]).unwrap();

        // Only the reverse copy 1 -> 3 regresses
        assert!(matches!(
            g.check_batch(&[3], &[1], &[2.0]),
            Err(GraphError::OutOfOrderTimestamp { vertex: 1, .. })
        ));
        assert!(g.check_batch(&[3], &[4], &[2.0]).is_ok());
    }
}
