//! Multi-hop, multi-snapshot temporal neighbor sampling
//!
//! The sampler is a pure reader of a `DynamicGraph`. For a set of root
//! vertices and cutoff timestamps it builds one bipartite computation layer
//! per hop and per snapshot window.

pub mod config;
pub mod layer;
pub mod temporal;

pub use config::{SamplerConfig, SamplingStrategy};
pub use layer::ComputationLayer;
pub use temporal::{SamplerError, SamplerResult, TemporalSampler};
