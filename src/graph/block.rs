//! Temporal block storage
//!
//! Every block holds up to `block_size` edges of one source vertex, stored
//! in descending timestamp order. Blocks live in a single arena and are
//! linked newest to oldest through `prev` handles.

use super::types::{BlockHandle, EdgeId, Timestamp, VertexId};
use std::mem;
use std::ops::Range;

/// Fixed-capacity, time-ordered run of edges belonging to one vertex
#[derive(Debug, Clone)]
pub struct TemporalBlock {
    targets: Vec<VertexId>,
    timestamps: Vec<Timestamp>,
    edge_ids: Vec<EdgeId>,
    capacity: usize,
    prev: Option<BlockHandle>,
}

impl TemporalBlock {
    /// Create an empty block able to hold `capacity` edges
    pub fn new(capacity: usize, prev: Option<BlockHandle>) -> Self {
        TemporalBlock {
            targets: Vec::with_capacity(capacity),
            timestamps: Vec::with_capacity(capacity),
            edge_ids: Vec::with_capacity(capacity),
            capacity,
            prev,
        }
    }

    /// Append an edge older than (or as old as) every stored edge.
    ///
    /// Returns `false` when the block is full.
    pub fn push_older(&mut self, target: VertexId, timestamp: Timestamp, edge_id: EdgeId) -> bool {
        if self.is_full() {
            return false;
        }
        debug_assert!(self.timestamps.last().map_or(true, |&t| t >= timestamp));
        self.targets.push(target);
        self.timestamps.push(timestamp);
        self.edge_ids.push(edge_id);
        true
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// The next older block of the same vertex
    pub fn prev(&self) -> Option<BlockHandle> {
        self.prev
    }

    pub fn targets(&self) -> &[VertexId] {
        &self.targets
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edge_ids
    }

    /// Newest timestamp in the block
    pub fn max_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.first().copied()
    }

    /// Oldest timestamp in the block
    pub fn min_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.last().copied()
    }

    /// Positions of the entries with `start <= ts <= end`
    pub fn range(&self, start: Timestamp, end: Timestamp) -> Range<usize> {
        let lo = self.timestamps.partition_point(|&t| t > end);
        let hi = self.timestamps.partition_point(|&t| t >= start);
        lo..hi.max(lo)
    }

    /// Heap bytes held by this block
    pub fn memory_usage(&self) -> usize {
        self.targets.capacity() * mem::size_of::<VertexId>()
            + self.timestamps.capacity() * mem::size_of::<Timestamp>()
            + self.edge_ids.capacity() * mem::size_of::<EdgeId>()
    }
}

/// Arena owning every temporal block
#[derive(Debug, Clone, Default)]
pub struct BlockArena {
    blocks: Vec<TemporalBlock>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a block into the arena and return its handle
    pub fn insert(&mut self, block: TemporalBlock) -> BlockHandle {
        let handle = BlockHandle::new(self.blocks.len());
        self.blocks.push(block);
        handle
    }

    pub fn get(&self, handle: BlockHandle) -> Option<&TemporalBlock> {
        self.blocks.get(handle.index())
    }

    /// Walk a chain from `head` towards older blocks
    pub fn chain(&self, head: Option<BlockHandle>) -> BlockChain<'_> {
        BlockChain {
            arena: self,
            next: head,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every block at once
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn memory_usage(&self) -> usize {
        self.blocks.capacity() * mem::size_of::<TemporalBlock>()
            + self.blocks.iter().map(TemporalBlock::memory_usage).sum::<usize>()
    }
}

/// Iterator over one vertex's blocks, newest first
pub struct BlockChain<'a> {
    arena: &'a BlockArena,
    next: Option<BlockHandle>,
}

impl<'a> Iterator for BlockChain<'a> {
    type Item = &'a TemporalBlock;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.arena.get(self.next?)?;
        self.next = block.prev();
        Some(block)
    }
}
