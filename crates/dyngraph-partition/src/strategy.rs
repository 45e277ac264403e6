//! Vertex placement strategies
//!
//! All strategies share one capability: given an unseen vertex, how many of
//! its batch neighbors already sit in each partition, and the current
//! per-partition load, pick a partition.

use crate::common::VertexId;
use crate::error::PartitionError;
use std::fmt;
use std::str::FromStr;

/// Streaming partition strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// `v mod P`, stateless
    #[default]
    Hash,
    /// Linear deterministic greedy
    Ldg,
    /// Fennel with vertex-count balance
    Fennel,
    /// Fennel with edge-count balance
    FennelEdge,
}

/// Inputs to a single placement decision
#[derive(Debug)]
pub struct PlacementContext<'a> {
    /// Neighbor (or incident edge) count per partition
    pub neighbor_counts: &'a [usize],
    /// Vertex load, or edge load for `FennelEdge`, per partition
    pub loads: &'a [usize],
    /// Vertices seen so far, including the current batch
    pub num_vertices: usize,
    /// Edges seen so far, including the current batch
    pub num_edges: usize,
    /// Fennel balance exponent
    pub gamma: f64,
    /// LDG capacity slack
    pub slack: f64,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Hash => "hash",
            Strategy::Ldg => "ldg",
            Strategy::Fennel => "fennel",
            Strategy::FennelEdge => "fennel_edge",
        }
    }

    /// Whether loads are measured in edges rather than vertices
    pub fn balances_edges(&self) -> bool {
        matches!(self, Strategy::FennelEdge)
    }

    /// Whether neighbor counts keep edge multiplicity
    pub fn counts_incident_edges(&self) -> bool {
        matches!(self, Strategy::FennelEdge)
    }

    /// Whether placement ignores the batch neighborhood entirely
    pub fn is_stateless(&self) -> bool {
        matches!(self, Strategy::Hash)
    }

    /// Choose a partition for `vertex`
    pub fn assign(&self, vertex: VertexId, ctx: &PlacementContext<'_>) -> usize {
        let num_partitions = ctx.loads.len();
        match self {
            Strategy::Hash => (vertex % num_partitions as u64) as usize,
            Strategy::Ldg => ldg(ctx),
            Strategy::Fennel => {
                let alpha = fennel_alpha(num_partitions, ctx.num_vertices, ctx.num_edges, ctx.gamma);
                fennel(ctx, alpha)
            }
            Strategy::FennelEdge => {
                let alpha = fennel_edge_alpha(num_partitions, ctx.num_vertices, ctx.num_edges, ctx.gamma);
                fennel(ctx, alpha)
            }
        }
    }
}

/// `|P ∩ N(v)| * (1 - |P| / C)`, ties to the lighter then lower partition
fn ldg(ctx: &PlacementContext<'_>) -> usize {
    let num_partitions = ctx.loads.len();
    let capacity = ((1.0 + ctx.slack) * ctx.num_vertices as f64 / num_partitions as f64).max(1.0);

    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for p in 0..num_partitions {
        let load = ctx.loads[p];
        let score = ctx.neighbor_counts[p] as f64 * (1.0 - load as f64 / capacity);
        if score > best_score || (score == best_score && load < ctx.loads[best]) {
            best = p;
            best_score = score;
        }
    }
    best
}

/// `count(v, P) - α·γ·|P|^(γ-1)`, ties to the lower partition
fn fennel(ctx: &PlacementContext<'_>, alpha: f64) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (p, &load) in ctx.loads.iter().enumerate() {
        let penalty = alpha * ctx.gamma * (load as f64).powf(ctx.gamma - 1.0);
        let score = ctx.neighbor_counts[p] as f64 - penalty;
        if score > best_score {
            best = p;
            best_score = score;
        }
    }
    best
}

fn fennel_alpha(num_partitions: usize, num_vertices: usize, num_edges: usize, gamma: f64) -> f64 {
    if num_vertices == 0 {
        return 0.0;
    }
    let n = num_vertices as f64;
    num_edges as f64 * (num_partitions as f64).powf(gamma - 1.0) / n.powf(gamma)
}

fn fennel_edge_alpha(num_partitions: usize, num_vertices: usize, num_edges: usize, gamma: f64) -> f64 {
    if num_vertices == 0 || num_edges == 0 {
        return 0.0;
    }
    let m = num_edges as f64;
    (num_partitions as f64 / m).powf(gamma - 1.0) * m / num_vertices as f64
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PartitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Ok(Strategy::Hash),
            "ldg" => Ok(Strategy::Ldg),
            "fennel" => Ok(Strategy::Fennel),
            "fennel_edge" | "fennel-edge" => Ok(Strategy::FennelEdge),
            other => Err(PartitionError::UnknownStrategy(other.to_string())),
        }
    }
}
