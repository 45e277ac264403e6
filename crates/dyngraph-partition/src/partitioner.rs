//! One-pass streaming partitioner
//!
//! For every batch the partitioner:
//! 1. routes edges whose authoritative endpoint (source, or destination when
//!    `assign_with_dst` is set) is already placed,
//! 2. places the unseen authoritative endpoints in ascending id order and
//!    routes their edges,
//! 3. places the remaining unseen endpoints so that every vertex of the
//!    batch ends up with a partition.
//!
//! Placement only looks at the current batch and the partition table, so
//! every rank replaying the same stream computes the same table.

use crate::common::{EdgeId, Partition, PartitionId, Timestamp, VertexId};
use crate::error::{PartitionError, PartitionResult};
use crate::stats::PartitionStats;
use crate::strategy::{PlacementContext, Strategy};
use crate::table::PartitionTable;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Partitioner configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartitionConfig {
    /// Placement strategy
    pub strategy: Strategy,
    /// Number of partitions (worker ranks)
    pub num_partitions: usize,
    /// Route edges by destination instead of source
    pub assign_with_dst: bool,
    /// Fennel balance exponent
    pub fennel_gamma: f64,
    /// LDG capacity slack over a perfectly even split
    pub ldg_slack: f64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Hash,
            num_partitions: 1,
            assign_with_dst: false,
            fennel_gamma: 1.5,
            ldg_slack: 0.1,
        }
    }
}

impl PartitionConfig {
    pub fn new(strategy: Strategy, num_partitions: usize, assign_with_dst: bool) -> Self {
        Self {
            strategy,
            num_partitions,
            assign_with_dst,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> PartitionResult<()> {
        if self.num_partitions == 0 {
            return Err(PartitionError::Configuration(
                "num_partitions must be at least 1".to_string(),
            ));
        }
        if self.num_partitions > PartitionId::MAX as usize {
            return Err(PartitionError::Configuration(format!(
                "num_partitions {} exceeds the partition table range",
                self.num_partitions
            )));
        }
        if !self.fennel_gamma.is_finite() || self.fennel_gamma < 1.0 {
            return Err(PartitionError::Configuration(format!(
                "fennel_gamma must be a finite value >= 1, got {}",
                self.fennel_gamma
            )));
        }
        if !self.ldg_slack.is_finite() || self.ldg_slack < 0.0 {
            return Err(PartitionError::Configuration(format!(
                "ldg_slack must be a finite non-negative value, got {}",
                self.ldg_slack
            )));
        }
        Ok(())
    }
}

/// Streaming partitioner over a common strategy contract
#[derive(Debug, Clone)]
pub struct StreamingPartitioner {
    config: PartitionConfig,
    table: PartitionTable,
    /// Assigned vertices per partition
    vertex_loads: Vec<usize>,
    /// Routed edges per partition
    edge_loads: Vec<usize>,
    num_edges_seen: usize,
}

impl StreamingPartitioner {
    /// Create a partitioner; fails on an invalid configuration
    pub fn new(config: PartitionConfig) -> PartitionResult<Self> {
        config.validate()?;
        let num_partitions = config.num_partitions;
        Ok(Self {
            config,
            table: PartitionTable::new(),
            vertex_loads: vec![0; num_partitions],
            edge_loads: vec![0; num_partitions],
            num_edges_seen: 0,
        })
    }

    /// Create a partitioner from a strategy name such as `"fennel_edge"`
    pub fn from_strategy_name(
        strategy: &str,
        num_partitions: usize,
        assign_with_dst: bool,
    ) -> PartitionResult<Self> {
        let strategy = strategy.parse::<Strategy>()?;
        Self::new(PartitionConfig::new(strategy, num_partitions, assign_with_dst))
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    pub fn num_partitions(&self) -> usize {
        self.config.num_partitions
    }

    pub fn partition_table(&self) -> &PartitionTable {
        &self.table
    }

    /// Full vertex -> partition array, `UNASSIGNED` for unseen vertices
    pub fn get_partition_table(&self) -> &[PartitionId] {
        self.table.as_slice()
    }

    pub fn partition_of(&self, vertex: VertexId) -> Option<usize> {
        self.table.get(vertex)
    }

    pub fn num_edges_seen(&self) -> usize {
        self.num_edges_seen
    }

    pub fn stats(&self) -> PartitionStats {
        PartitionStats::new(self.vertex_loads.clone(), self.edge_loads.clone())
    }

    /// Split one batch into `num_partitions` edge subsets.
    ///
    /// Fails with `InvalidBatchShape` before touching any state if the
    /// arrays differ in length or a vertex id cannot be indexed.
    pub fn partition(
        &mut self,
        sources: &[VertexId],
        targets: &[VertexId],
        timestamps: &[Timestamp],
        edge_ids: &[EdgeId],
    ) -> PartitionResult<Vec<Partition>> {
        let n = sources.len();
        if targets.len() != n || timestamps.len() != n || edge_ids.len() != n {
            return Err(PartitionError::InvalidBatchShape(format!(
                "sources={}, targets={}, timestamps={}, edge_ids={}",
                n,
                targets.len(),
                timestamps.len(),
                edge_ids.len()
            )));
        }

        let num_partitions = self.config.num_partitions;
        if n == 0 {
            return Ok(vec![Partition::default(); num_partitions]);
        }

        if let Some(&max_vertex) = sources.iter().chain(targets).max() {
            if !self.table.ensure_vertex(max_vertex) {
                return Err(PartitionError::InvalidBatchShape(format!(
                    "vertex id {} exceeds the addressable range",
                    max_vertex
                )));
            }
        }

        let (keys, others) = if self.config.assign_with_dst {
            (targets, sources)
        } else {
            (sources, targets)
        };

        let unseen: FxHashSet<VertexId> = sources
            .iter()
            .chain(targets)
            .copied()
            .filter(|&v| !self.table.is_assigned(v))
            .collect();
        let num_assigned: usize = self.vertex_loads.iter().sum();
        let num_vertices = num_assigned + unseen.len();
        self.num_edges_seen += n;

        let adjacency = if self.config.strategy.is_stateless() {
            FxHashMap::default()
        } else {
            batch_adjacency(sources, targets)
        };

        // Edges of already placed vertices
        let mut routes = vec![0usize; n];
        let mut pending: BTreeMap<VertexId, Vec<usize>> = BTreeMap::new();
        for (i, &key) in keys.iter().enumerate() {
            match self.table.get(key) {
                Some(p) => {
                    routes[i] = p;
                    self.edge_loads[p] += 1;
                }
                None => pending.entry(key).or_default().push(i),
            }
        }

        // Unseen authoritative endpoints, ascending id
        let num_leaders = pending.len();
        for (vertex, edges) in pending {
            let p = self.place(vertex, &adjacency, num_vertices);
            self.edge_loads[p] += edges.len();
            for i in edges {
                routes[i] = p;
            }
        }

        // Remaining unseen endpoints
        let followers: BTreeSet<VertexId> = others
            .iter()
            .copied()
            .filter(|&v| !self.table.is_assigned(v))
            .collect();
        let num_followers = followers.len();
        for vertex in followers {
            self.place(vertex, &adjacency, num_vertices);
        }

        let mut partitions: Vec<Partition> = (0..num_partitions)
            .map(|_| Partition::with_capacity(n / num_partitions + 1))
            .collect();
        for (i, &p) in routes.iter().enumerate() {
            partitions[p].push(sources[i], targets[i], timestamps[i], edge_ids[i]);
        }

        debug!(
            "Placed {} routing vertices and {} endpoint vertices",
            num_leaders, num_followers
        );
        info!(
            "Partitioned {} edges with {} into {} partitions",
            n, self.config.strategy, num_partitions
        );

        Ok(partitions)
    }

    /// Place one unseen vertex and record it in the table
    fn place(
        &mut self,
        vertex: VertexId,
        adjacency: &FxHashMap<VertexId, Vec<VertexId>>,
        num_vertices: usize,
    ) -> usize {
        let strategy = self.config.strategy;
        let mut neighbor_counts = vec![0usize; self.config.num_partitions];

        if !strategy.is_stateless() {
            if let Some(neighbors) = adjacency.get(&vertex) {
                if strategy.counts_incident_edges() {
                    for &u in neighbors {
                        if let Some(p) = self.table.get(u) {
                            neighbor_counts[p] += 1;
                        }
                    }
                } else {
                    let mut distinct = FxHashSet::default();
                    for &u in neighbors {
                        if distinct.insert(u) {
                            if let Some(p) = self.table.get(u) {
                                neighbor_counts[p] += 1;
                            }
                        }
                    }
                }
            }
        }

        let partition = {
            let loads = if strategy.balances_edges() {
                &self.edge_loads
            } else {
                &self.vertex_loads
            };
            let ctx = PlacementContext {
                neighbor_counts: &neighbor_counts,
                loads,
                num_vertices,
                num_edges: self.num_edges_seen,
                gamma: self.config.fennel_gamma,
                slack: self.config.ldg_slack,
            };
            strategy.assign(vertex, &ctx)
        };

        if self.table.assign(vertex, partition) {
            self.vertex_loads[partition] += 1;
        }
        partition
    }
}

/// Undirected neighbor lists of the batch, with edge multiplicity
fn batch_adjacency(sources: &[VertexId], targets: &[VertexId]) -> FxHashMap<VertexId, Vec<VertexId>> {
    let mut adjacency: FxHashMap<VertexId, Vec<VertexId>> = FxHashMap::default();
    for (&s, &t) in sources.iter().zip(targets) {
        adjacency.entry(s).or_default().push(t);
        if s != t {
            adjacency.entry(t).or_default().push(s);
        }
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::UNASSIGNED;

    fn batch(edges: &[(u64, u64)]) -> (Vec<u64>, Vec<u64>, Vec<f64>, Vec<u64>) {
        let sources = edges.iter().map(|e| e.0).collect();
        let targets = edges.iter().map(|e| e.1).collect();
        let timestamps = (0..edges.len()).map(|i| i as f64).collect();
        let edge_ids = (0..edges.len() as u64).collect();
        (sources, targets, timestamps, edge_ids)
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            StreamingPartitioner::new(PartitionConfig::new(Strategy::Hash, 0, false)),
            Err(PartitionError::Configuration(_))
        ));
        assert!(matches!(
            StreamingPartitioner::from_strategy_name("spectral", 4, false),
            Err(PartitionError::UnknownStrategy(_))
        ));

        let mut config = PartitionConfig::new(Strategy::Fennel, 2, false);
        config.fennel_gamma = 0.5;
        assert!(StreamingPartitioner::new(config).is_err());
    }

    #[test]
    fn test_mismatched_batch_leaves_state_untouched() {
        let mut partitioner = StreamingPartitioner::from_strategy_name("ldg", 2, false).unwrap();
        let result = partitioner.partition(&[0, 1], &[1], &[0.0, 1.0], &[0, 1]);
        assert!(matches!(result, Err(PartitionError::InvalidBatchShape(_))));
        assert!(partitioner.get_partition_table().is_empty());
        assert_eq!(partitioner.num_edges_seen(), 0);
    }

    #[test]
    fn test_unindexable_vertex_is_rejected() {
        let mut partitioner = StreamingPartitioner::from_strategy_name("fennel", 2, false).unwrap();
        let result = partitioner.partition(&[0, u64::MAX], &[1, 0], &[0.0, 1.0], &[0, 1]);
        assert!(matches!(result, Err(PartitionError::InvalidBatchShape(_))));
        assert!(partitioner.get_partition_table().is_empty());
        assert_eq!(partitioner.num_edges_seen(), 0);
        assert_eq!(partitioner.stats().total_edges(), 0);
    }

    #[test]
    fn test_empty_batch() {
        let mut partitioner = StreamingPartitioner::from_strategy_name("hash", 3, false).unwrap();
        let partitions = partitioner.partition(&[], &[], &[], &[]).unwrap();
        assert_eq!(partitions.len(), 3);
        assert!(partitions.iter().all(|p| p.is_empty()));
    }

    #[test]
    fn test_hash_routes_by_source() {
        let mut partitioner = StreamingPartitioner::from_strategy_name("hash", 2, false).unwrap();
        let (s, t, ts, ids) = batch(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let partitions = partitioner.partition(&s, &t, &ts, &ids).unwrap();

        assert_eq!(partitions[0].sources, vec![0, 2]);
        assert_eq!(partitions[0].edge_ids, vec![0, 2]);
        assert_eq!(partitions[1].sources, vec![1, 3]);
        assert_eq!(partitioner.get_partition_table(), &[0, 1, 0, 1]);
    }

    #[test]
    fn test_hash_routes_by_destination() {
        let mut partitioner = StreamingPartitioner::from_strategy_name("hash", 2, true).unwrap();
        let (s, t, ts, ids) = batch(&[(0, 1), (1, 2), (2, 3)]);
        let partitions = partitioner.partition(&s, &t, &ts, &ids).unwrap();

        assert_eq!(partitions[1].targets, vec![1, 3]);
        assert_eq!(partitions[0].targets, vec![2]);
    }

    #[test]
    fn test_greedy_colocates_with_neighbors() {
        for strategy in ["ldg", "fennel", "fennel_edge"] {
            let mut partitioner = StreamingPartitioner::from_strategy_name(strategy, 2, false).unwrap();
            // Isolated vertices alternate between the two partitions
            let loops: Vec<(u64, u64)> = (0..8).map(|v| (v, v)).collect();
            let (s, t, ts, ids) = batch(&loops);
            partitioner.partition(&s, &t, &ts, &ids).unwrap();
            assert_eq!(
                partitioner.get_partition_table(),
                &[0, 1, 0, 1, 0, 1, 0, 1],
                "{}",
                strategy
            );

            // A newcomer linked only to partition 0 joins it
            let (s, t, ts, ids) = batch(&[(100, 0), (100, 2), (100, 4), (100, 6)]);
            let partitions = partitioner.partition(&s, &t, &ts, &ids).unwrap();
            assert_eq!(partitioner.partition_of(100), Some(0), "{}", strategy);
            assert_eq!(partitions[0].len(), 4);
            assert!(partitions[1].is_empty());
            assert_eq!(partitioner.get_partition_table()[50], UNASSIGNED);
        }
    }

    #[test]
    fn test_assignment_survives_later_batches() {
        let mut partitioner = StreamingPartitioner::from_strategy_name("fennel", 3, false).unwrap();
        let (s, t, ts, ids) = batch(&[(0, 1), (2, 3), (4, 5)]);
        partitioner.partition(&s, &t, &ts, &ids).unwrap();
        let before = partitioner.get_partition_table().to_vec();

        let (s, t, ts, ids) = batch(&[(1, 0), (3, 6), (5, 7)]);
        let partitions = partitioner.partition(&s, &t, &ts, &ids).unwrap();
        let after = partitioner.get_partition_table();

        assert_eq!(&after[..before.len()], &before[..]);
        // Edges follow the existing placement of their source
        for (p, part) in partitions.iter().enumerate() {
            for &src in &part.sources {
                assert_eq!(after[src as usize], p as PartitionId);
            }
        }
    }
}
