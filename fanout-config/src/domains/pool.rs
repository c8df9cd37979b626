//! Local process pool configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local process pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Concurrent worker cap; the detected core count when unset
    pub workers: Option<usize>,

    /// Prebuilt worker executable honoring the (function, dir, id) contract
    #[serde(default = "default_worker_path")]
    pub worker_path: PathBuf,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: None,
            worker_path: default_worker_path(),
        }
    }
}

impl Validatable for PoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(workers) = self.workers {
            validate_positive(workers, "workers", self.domain_name())?;
        }

        if self.worker_path.as_os_str().is_empty() {
            return Err(self.validation_error("worker_path cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "pool"
    }
}

fn default_worker_path() -> PathBuf {
    PathBuf::from("fanout-worker")
}
