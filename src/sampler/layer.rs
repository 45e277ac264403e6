//! Computation layers produced by the sampler
//!
//! Rows `0..num_dst_nodes` are the destinations of the hop in input order;
//! the remaining rows are sampled neighbors, one row per sampled edge.
//! Identity is by row: the same vertex may occupy many rows, each with its
//! own timestamp.

use crate::graph::{EdgeId, Timestamp, VertexId};
use serde::{Deserialize, Serialize};

/// One hop's bipartite subgraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputationLayer {
    /// Vertex id per row
    pub(crate) node_ids: Vec<VertexId>,
    /// Timestamp per row
    pub(crate) node_timestamps: Vec<Timestamp>,
    /// Sampled row of each edge
    pub(crate) edge_src: Vec<usize>,
    /// Destination row of each edge
    pub(crate) edge_dst: Vec<usize>,
    /// `dst_timestamp - src_timestamp` per edge
    pub(crate) edge_dt: Vec<Timestamp>,
    /// Store edge id per edge
    pub(crate) edge_ids: Vec<EdgeId>,
    num_dst_nodes: usize,
}

impl ComputationLayer {
    /// Layer holding only destination rows
    pub(crate) fn with_destinations(node_ids: Vec<VertexId>, node_timestamps: Vec<Timestamp>) -> Self {
        let num_dst_nodes = node_ids.len();
        Self {
            node_ids,
            node_timestamps,
            num_dst_nodes,
            ..Default::default()
        }
    }

    /// Append a sampled row wired to `dst_row`
    pub(crate) fn push_sampled(
        &mut self,
        dst_row: usize,
        vertex: VertexId,
        timestamp: Timestamp,
        dt: Timestamp,
        edge_id: EdgeId,
    ) {
        let src_row = self.node_ids.len();
        self.node_ids.push(vertex);
        self.node_timestamps.push(timestamp);
        self.edge_src.push(src_row);
        self.edge_dst.push(dst_row);
        self.edge_dt.push(dt);
        self.edge_ids.push(edge_id);
    }

    /// Vertex id per row
    pub fn node_ids(&self) -> &[VertexId] {
        &self.node_ids
    }

    pub fn node_timestamps(&self) -> &[Timestamp] {
        &self.node_timestamps
    }

    /// Sampled row of each edge
    pub fn edge_src(&self) -> &[usize] {
        &self.edge_src
    }

    /// Destination row of each edge
    pub fn edge_dst(&self) -> &[usize] {
        &self.edge_dst
    }

    pub fn edge_dt(&self) -> &[Timestamp] {
        &self.edge_dt
    }

    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edge_ids
    }

    pub fn num_dst_nodes(&self) -> usize {
        self.num_dst_nodes
    }

    /// Total rows, destinations included
    pub fn num_nodes(&self) -> usize {
        self.node_ids.len()
    }

    pub fn num_sampled_nodes(&self) -> usize {
        self.node_ids.len() - self.num_dst_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.edge_src.len()
    }

    pub fn dst_node_ids(&self) -> &[VertexId] {
        &self.node_ids[..self.num_dst_nodes]
    }

    pub fn dst_timestamps(&self) -> &[Timestamp] {
        &self.node_timestamps[..self.num_dst_nodes]
    }

    /// Vertex ids of the sampled rows, the next hop's destinations
    pub fn sampled_node_ids(&self) -> &[VertexId] {
        &self.node_ids[self.num_dst_nodes..]
    }

    pub fn sampled_timestamps(&self) -> &[Timestamp] {
        &self.node_timestamps[self.num_dst_nodes..]
    }

    /// `(src_row, dst_row)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_src.iter().copied().zip(self.edge_dst.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_and_edges() {
        let mut layer = ComputationLayer::with_destinations(vec![7, 8], vec![3.0, 3.0]);
        layer.push_sampled(0, 1, 2.0, 1.0, 11);
        layer.push_sampled(1, 7, 0.5, 2.5, 12);

        assert_eq!(layer.num_dst_nodes(), 2);
        assert_eq!(layer.num_nodes(), 4);
        assert_eq!(layer.num_sampled_nodes(), 2);
        assert_eq!(layer.num_edges(), 2);
        assert_eq!(layer.dst_node_ids(), &[7, 8]);
        assert_eq!(layer.sampled_node_ids(), &[1, 7]);
        assert_eq!(layer.sampled_timestamps(), &[2.0, 0.5]);
        assert_eq!(layer.edges().collect::<Vec<_>>(), vec![(2, 0), (3, 1)]);
        assert_eq!(layer.node_ids().len(), layer.node_timestamps().len());
    }

    #[test]
    fn test_accessors_keep_rows_aligned() {
        let mut layer = ComputationLayer::with_destinations(vec![4], vec![9.0]);
        layer.push_sampled(0, 2, 6.0, 3.0, 21);
        layer.push_sampled(0, 3, 8.0, 1.0, 20);

        assert_eq!(layer.node_ids(), &[4, 2, 3]);
        assert_eq!(layer.node_timestamps(), &[9.0, 6.0, 8.0]);
        assert_eq!(layer.edge_src(), &[1, 2]);
        assert_eq!(layer.edge_dst(), &[0, 0]);
        assert_eq!(layer.edge_ids(), &[21, 20]);
        for (i, (src, dst)) in layer.edges().enumerate() {
            let dt = layer.node_timestamps()[dst] - layer.node_timestamps()[src];
            assert_eq!(layer.edge_dt()[i], dt);
            assert!(src >= layer.num_dst_nodes() && src < layer.num_nodes());
        }
    }

    #[test]
    fn test_empty_layer() {
        let layer = ComputationLayer::with_destinations(vec![], vec![]);
        assert_eq!(layer.num_nodes(), 0);
        assert_eq!(layer.num_edges(), 0);
        assert!(layer.sampled_node_ids().is_empty());
    }
}
