//! Stall detection and checkpointing for the scheduler backend

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fanout_cluster::{TaskId, TaskState, TaskStatus};
use fanout_protocol::JobDir;

use crate::error::EngineResult;

/// Name of the progress checkpoint inside the protocol directory
pub const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Whether a task should be reclaimed
///
/// Stalled means the scheduler still reports it running, it is past the
/// grace period, and it has consumed almost no CPU relative to wall time.
/// A slow-but-computing task keeps a high ratio and is left alone, as is
/// anything queued or already terminal.
pub fn is_stalled(status: &TaskStatus, grace: Duration, cpu_threshold: f64) -> bool {
    status.state == TaskState::Running
        && status.elapsed > grace
        && status.cpu_ratio() < cpu_threshold
}

/// Progress snapshot persisted on every watchdog pass
///
/// Lets an operator inspect (or in principle resume) a batch whose
/// dispatching process died; it lives in the scratch directory and goes
/// away with it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Pending job index -> scheduler task handle
    pub tasks: BTreeMap<u64, String>,
    pub completed: usize,
    pub resubmitted: u64,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(tasks: &HashMap<u64, TaskId>, completed: usize, resubmitted: u64) -> Self {
        Self {
            tasks: tasks.iter().map(|(id, t)| (*id, t.0.clone())).collect(),
            completed,
            resubmitted,
            updated_at: Utc::now(),
        }
    }
}

/// Persist the checkpoint into the protocol directory
pub async fn write_checkpoint(dir: &JobDir, checkpoint: &Checkpoint) -> EngineResult<()> {
    let bytes = serde_json::to_vec_pretty(checkpoint)?;
    tokio::fs::write(dir.root().join(CHECKPOINT_FILE), bytes).await?;
    Ok(())
}
