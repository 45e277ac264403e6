//! Rank-level sharding
//!
//! Every worker rank owns one `DynamicGraph`. A `BatchRouter` replays the
//! dataset stream through the streaming partitioner and hands each rank its
//! share of every batch.

pub mod rank;
pub mod router;

pub use rank::{RankGraph, RankId, RankWriteGuard};
pub use router::{BatchRouter, ShardError, ShardResult};
