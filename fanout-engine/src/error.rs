//! Engine error types

use std::time::Duration;
use thiserror::Error;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Dispatch engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Fatal configuration problem, raised before any job executes
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Job-file protocol failure
    #[error("Protocol error: {0}")]
    Protocol(#[from] fanout_protocol::ProtocolError),

    /// External scheduler or queue daemon failure
    #[error("Cluster error: {0}")]
    Cluster(#[from] fanout_cluster::ClusterError),

    /// An index was written twice; each job completes at most once
    #[error("Result for job {0} was already recorded")]
    DuplicateResult(u64),

    /// A completion signal referenced an index outside the batch
    #[error("Job index {index} outside batch of {len}")]
    IndexOutOfRange { index: u64, len: usize },

    /// The run exceeded its configured wall-clock budget
    #[error("Run exceeded its {0:?} budget")]
    Timeout(Duration),

    /// A local worker process could not be started
    #[error("Worker process error: {0}")]
    Worker(String),

    /// Checkpoint or payload encoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure outside the protocol layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<fanout_config::ConfigError> for EngineError {
    fn from(err: fanout_config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
