//! Engine-level dispatch configuration

use crate::domains::utils;
use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Backend selected for a batch run
///
/// An unrecognized name fails deserialization, so a bad selector is rejected
/// before any job executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Plain in-process loop
    Sequential,
    /// Bounded pool of local worker processes
    Pool,
    /// Always-on external queue daemon
    Queue,
    /// External batch scheduler with stall watchdog
    Scheduler,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Sequential
    }
}

/// Configuration shared by every backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Backend used for this run
    pub backend: BackendKind,

    /// Whether job return values are collected into the result set
    #[serde(default = "utils::default_true")]
    pub store: bool,

    /// Directory under which per-run scratch directories are created
    #[serde(default = "default_share_dir")]
    pub share_dir: PathBuf,

    /// Sleep between completion polls
    #[serde(with = "utils::serde_duration_ms", default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Overall wall-clock budget for one engine run; unbounded when unset.
    /// A run abandoned at the deadline may leave its scratch directory behind.
    #[serde(with = "utils::serde_duration_option", default)]
    pub max_run_duration: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            store: true,
            share_dir: default_share_dir(),
            poll_interval: default_poll_interval(),
            max_run_duration: None,
        }
    }
}

impl Validatable for DispatchConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.poll_interval.as_millis(),
            "poll_interval",
            self.domain_name(),
        )?;

        if let Some(budget) = self.max_run_duration {
            validate_positive(budget.as_millis(), "max_run_duration", self.domain_name())?;
        }

        if self.share_dir.as_os_str().is_empty() {
            return Err(self.validation_error("share_dir cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "dispatch"
    }
}

// Default value functions
fn default_share_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}
