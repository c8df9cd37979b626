//! Fanout dispatch engine
//!
//! Distributes a batch of independent jobs to one of several execution
//! backends and collects their results in submission order, exactly once
//! each. Real parallelism happens outside this process, in local worker
//! processes or on cluster nodes; the engine itself only launches work and
//! polls for completion signals.

pub mod backend;
pub mod engine;
pub mod error;
pub mod job;
pub mod pool;
pub mod queue;
pub mod scheduler;
pub mod sequential;
pub mod watchdog;
pub mod worker;

// Re-export main types
pub use backend::Backend;
pub use engine::DispatchEngine;
pub use error::{EngineError, EngineResult};
pub use job::{FnJob, Job, JobBatch, JobFunction, ResultSet, RunOutcome};
pub use pool::LocalPoolBackend;
pub use queue::ClusterQueueBackend;
pub use scheduler::ClusterSchedulerBackend;
pub use sequential::SequentialBackend;
pub use worker::run_worker;
