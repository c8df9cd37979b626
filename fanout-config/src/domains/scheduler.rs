//! External batch scheduler configuration

use crate::domains::utils;
use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_ratio, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// External batch scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Scheduler command-line tool invoked for every operation
    #[serde(default = "default_command")]
    pub command: String,

    /// Scheduler head-node address passed to the tool
    #[serde(default = "default_address")]
    pub address: String,

    /// Worker executable started on the remote nodes
    #[serde(default = "default_worker_path")]
    pub worker_path: PathBuf,

    /// Largest id range submitted in one scheduler request
    #[serde(default = "default_max_tasks_per_submission")]
    pub max_tasks_per_submission: usize,

    /// Time between stall watchdog passes
    #[serde(with = "utils::serde_duration", default = "default_watchdog_interval")]
    pub watchdog_interval: Duration,

    /// Minimum task age before it can be flagged as stalled
    #[serde(with = "utils::serde_duration", default = "default_stall_grace")]
    pub stall_grace: Duration,

    /// A running task whose cpu-time / wall-time ratio falls below this is
    /// considered stalled once past the grace period
    #[serde(default = "default_stall_cpu_threshold")]
    pub stall_cpu_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            address: default_address(),
            worker_path: default_worker_path(),
            max_tasks_per_submission: default_max_tasks_per_submission(),
            watchdog_interval: default_watchdog_interval(),
            stall_grace: default_stall_grace(),
            stall_cpu_threshold: default_stall_cpu_threshold(),
        }
    }
}

impl Validatable for SchedulerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.command, "command", self.domain_name())?;
        validate_required_string(&self.address, "address", self.domain_name())?;

        if self.worker_path.as_os_str().is_empty() {
            return Err(self.validation_error("worker_path cannot be empty"));
        }

        validate_positive(
            self.max_tasks_per_submission,
            "max_tasks_per_submission",
            self.domain_name(),
        )?;
        validate_positive(
            self.watchdog_interval.as_millis(),
            "watchdog_interval",
            self.domain_name(),
        )?;
        validate_ratio(
            self.stall_cpu_threshold,
            "stall_cpu_threshold",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scheduler"
    }
}

// Default value functions
fn default_command() -> String {
    "batchctl".to_string()
}

fn default_address() -> String {
    "localhost".to_string()
}

fn default_worker_path() -> PathBuf {
    PathBuf::from("fanout-worker")
}

fn default_max_tasks_per_submission() -> usize {
    64
}

fn default_watchdog_interval() -> Duration {
    Duration::from_secs(120)
}

fn default_stall_grace() -> Duration {
    Duration::from_secs(120)
}

fn default_stall_cpu_threshold() -> f64 {
    0.01
}
