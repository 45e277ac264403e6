//! Partitioner errors

use thiserror::Error;

/// Errors raised by the streaming partitioner
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartitionError {
    #[error("Invalid batch shape: {0}")]
    InvalidBatchShape(String),

    #[error("Invalid partitioner configuration: {0}")]
    Configuration(String),

    #[error("Unknown partition strategy: {0}")]
    UnknownStrategy(String),
}

pub type PartitionResult<T> = Result<T, PartitionError>;
