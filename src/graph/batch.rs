//! Ingestion batches
//!
//! A batch is three equal-length sequences validated once at the ingress
//! boundary. Ordering inside a batch is not assumed; the store sorts.

use super::store::{GraphError, GraphResult};
use super::types::{Timestamp, VertexId};
use serde::{Deserialize, Serialize};

/// A validated batch of `(source, target, timestamp)` edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeBatch {
    sources: Vec<VertexId>,
    targets: Vec<VertexId>,
    timestamps: Vec<Timestamp>,
}

impl EdgeBatch {
    /// Build a batch, rejecting mismatched, empty or NaN-stamped input
    pub fn new(
        sources: Vec<VertexId>,
        targets: Vec<VertexId>,
        timestamps: Vec<Timestamp>,
    ) -> GraphResult<Self> {
        validate(&sources, &targets, &timestamps)?;
        Ok(Self {
            sources,
            targets,
            timestamps,
        })
    }

    /// Build a batch from `(source, target, timestamp)` triples
    pub fn from_edges<I>(edges: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = (VertexId, VertexId, Timestamp)>,
    {
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let mut timestamps = Vec::new();
        for (s, t, ts) in edges {
            sources.push(s);
            targets.push(t);
            timestamps.push(ts);
        }
        Self::new(sources, targets, timestamps)
    }

    pub fn sources(&self) -> &[VertexId] {
        &self.sources
    }

    pub fn targets(&self) -> &[VertexId] {
        &self.targets
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always `false` for a constructed batch
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Largest vertex id mentioned by either endpoint
    pub fn max_vertex(&self) -> VertexId {
        self.sources
            .iter()
            .chain(&self.targets)
            .copied()
            .max()
            .unwrap_or(0)
    }

    pub fn into_parts(self) -> (Vec<VertexId>, Vec<VertexId>, Vec<Timestamp>) {
        (self.sources, self.targets, self.timestamps)
    }
}

/// Shape check shared by `EdgeBatch::new` and the slice-based ingestion path
pub(crate) fn validate(
    sources: &[VertexId],
    targets: &[VertexId],
    timestamps: &[Timestamp],
) -> GraphResult<()> {
    if sources.is_empty() {
        return Err(GraphError::InvalidBatchShape("batch is empty".to_string()));
    }
    if sources.len() != targets.len() || sources.len() != timestamps.len() {
        return Err(GraphError::InvalidBatchShape(format!(
            "sources={}, targets={}, timestamps={}",
            sources.len(),
            targets.len(),
            timestamps.len()
        )));
    }
    if let Some(i) = timestamps.iter().position(|t| t.is_nan()) {
        return Err(GraphError::InvalidBatchShape(format!(
            "timestamp at position {} is NaN",
            i
        )));
    }
    if let Some(&vertex) = sources.iter().chain(targets).find(|&&v| slots_for(v).is_none()) {
        return Err(GraphError::InvalidBatchShape(format!(
            "vertex id {} exceeds the addressable range",
            vertex
        )));
    }
    Ok(())
}

/// Dense slots needed to index `vertex`; `None` past the address space
pub(crate) fn slots_for(vertex: VertexId) -> Option<usize> {
    usize::try_from(vertex).ok()?.checked_add(1)
}
