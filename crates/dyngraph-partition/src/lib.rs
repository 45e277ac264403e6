//! Streaming partitioners for temporal edge streams
//!
//! Each ingestion batch is split into one edge subset per partition while a
//! vertex -> partition table is grown in a single pass. Past batches are
//! never revisited and an assigned vertex never moves.

pub mod common;
pub mod error;
pub mod partitioner;
pub mod stats;
pub mod strategy;
pub mod table;

pub use common::{EdgeId, Partition, PartitionId, Timestamp, VertexId};
pub use error::{PartitionError, PartitionResult};
pub use partitioner::{PartitionConfig, StreamingPartitioner};
pub use stats::{edge_cut, PartitionStats};
pub use strategy::Strategy;
pub use table::{PartitionTable, UNASSIGNED};
