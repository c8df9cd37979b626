//! Cluster surface error types

use thiserror::Error;

/// Errors from the external scheduler and queue daemon boundary
#[derive(Error, Debug)]
pub enum ClusterError {
    /// The scheduler tool exited non-zero; carries the raw diagnostic
    #[error("Scheduler tool '{program}' failed: {diagnostic}")]
    Tool { program: String, diagnostic: String },

    /// The scheduler tool could not be started at all
    #[error("I/O error running scheduler tool: {0}")]
    Io(#[from] std::io::Error),

    /// A reply lacked a field the caller asked for
    #[error("Missing field '{field}' in scheduler reply")]
    MissingField { field: String },

    /// A reply field was present but unusable
    #[error("Malformed scheduler reply: {0}")]
    Malformed(String),

    /// The in-memory rendezvous with the queue daemon was torn down
    #[error("Queue channel closed")]
    ChannelClosed,
}
