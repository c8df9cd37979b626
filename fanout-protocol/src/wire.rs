//! Wire formats written into protocol files

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Content of a job's `-in` file
///
/// The `store` flag rides in the envelope so the worker invocation contract
/// stays at exactly `(function, dir, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    pub args: JsonValue,
    pub store: bool,
}

impl JobInput {
    pub fn new(args: JsonValue, store: bool) -> Self {
        Self { args, store }
    }
}

/// Content of a job's `-out` file
///
/// `Error` is the explicit per-job failure signal, distinct from a normal
/// result; a worker that crashes outright writes neither this nor `-done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobOutcome {
    Success {
        #[serde(default)]
        value: Option<JsonValue>,
    },
    Error {
        message: String,
    },
}

impl JobOutcome {
    /// Create a successful outcome
    pub fn success(value: Option<JsonValue>) -> Self {
        Self::Success { value }
    }

    /// Create a failed outcome
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
