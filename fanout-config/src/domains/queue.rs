//! External queue daemon configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// External queue daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue daemon address
    #[serde(default = "default_address")]
    pub address: String,

    /// Jobs packed into one daemon submission; the daemon runs each group as
    /// a nested sequential sub-dispatch to amortize per-task overhead
    #[serde(default = "default_group")]
    pub group: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            group: default_group(),
        }
    }
}

impl Validatable for QueueConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.address, "address", self.domain_name())?;
        validate_positive(self.group, "group", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "queue"
    }
}

fn default_address() -> String {
    "localhost".to_string()
}

fn default_group() -> usize {
    1
}
