//! External cluster surface for Fanout
//!
//! Everything the dispatch engine knows about the outside cluster lives
//! behind two narrow seams: [`SchedulerClient`] for the batch scheduler's
//! command-line tools and [`QueueClient`] for the always-on queue daemon.
//! The engine's watchdog logic stays independent of exact tool phrasing; the
//! only text parsing is [`parse_field`] over the tools' key:value replies.

pub mod cli;
pub mod error;
pub mod parse;
pub mod queue;
pub mod scheduler;

// Re-export main types
pub use cli::CliScheduler;
pub use error::ClusterError;
pub use parse::{parse_field, require_field};
pub use queue::{ChannelQueueClient, QueueClient, QueueEndpoint, QueueJob, QueueResponse, QueueSubmission};
pub use scheduler::{MockSchedulerClient, SchedulerClient, TaskId, TaskState, TaskStatus};
