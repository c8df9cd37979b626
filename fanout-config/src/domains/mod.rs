//! Domain-specific configuration modules

pub mod dispatch;
pub mod pool;
pub mod queue;
pub mod scheduler;
pub mod utils;

use serde::{Deserialize, Serialize};

use dispatch::DispatchConfig;
use pool::PoolConfig;
use queue::QueueConfig;
use scheduler::SchedulerConfig;

/// Top-level Fanout configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Settings shared by every backend
    pub dispatch: DispatchConfig,

    /// Local process pool settings
    pub pool: PoolConfig,

    /// External scheduler settings; required when the scheduler backend is
    /// selected
    pub scheduler: Option<SchedulerConfig>,

    /// Queue daemon settings; required when the queue backend is selected
    pub queue: Option<QueueConfig>,
}
