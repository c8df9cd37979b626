//! Scheduler-facing types and the client seam

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;

use crate::error::ClusterError;

/// Opaque scheduler-assigned task handle
///
/// A parametric (ranged) submission yields one base handle; individual
/// members are addressed as `base[id]`, the array-task notation the
/// scheduler tools understand for view and cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    /// Handle of one member of a parametric task
    pub fn member(&self, id: u64) -> TaskId {
        TaskId(format!("{}[{}]", self.0, id))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheduler-reported task state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Done,
    Failed,
    Unknown,
}

impl TaskState {
    /// Parse the state word the scheduler tool prints
    pub fn parse(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "queued" | "pending" | "waiting" => TaskState::Queued,
            "running" => TaskState::Running,
            "done" | "finished" | "completed" => TaskState::Done,
            "failed" | "error" | "exited" => TaskState::Failed,
            _ => TaskState::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }
}

/// One task's state as reported by the scheduler
///
/// Scheduler state can be stale or lie about a zombie process; the
/// cpu-time / wall-time ratio is the cheap, scheduler-agnostic liveness
/// signal the watchdog acts on.
#[derive(Debug, Clone)]
pub struct TaskStatus {
    pub state: TaskState,
    pub elapsed: Duration,
    pub cpu_time: Duration,
}

impl TaskStatus {
    /// Fraction of wall time the task actually spent computing
    pub fn cpu_ratio(&self) -> f64 {
        if self.elapsed.is_zero() {
            // Too young to judge; report full progress
            return 1.0;
        }
        self.cpu_time.as_secs_f64() / self.elapsed.as_secs_f64()
    }
}

/// The engine's seam onto the external batch scheduler
#[automock]
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Total compute slots currently available cluster-wide
    async fn total_slots(&self) -> Result<usize, ClusterError>;

    /// Submit one parametric task expanding into subtasks `first..=last`,
    /// each invoking `worker function <dir> <id>` with `dir` as its working
    /// directory; cheaper than `last - first + 1` individual submissions
    async fn submit_range(
        &self,
        dir: &Path,
        worker: &Path,
        function: &str,
        first: u64,
        last: u64,
        slots_hint: usize,
    ) -> Result<TaskId, ClusterError>;

    /// Submit a single-id task
    async fn submit_single(
        &self,
        dir: &Path,
        worker: &Path,
        function: &str,
        id: u64,
        slots_hint: usize,
    ) -> Result<TaskId, ClusterError>;

    /// Query one task's state, elapsed wall time and consumed cpu time
    async fn task_status(&self, task: &TaskId) -> Result<TaskStatus, ClusterError>;

    /// Cancel a task (or one member of a parametric task)
    async fn cancel(&self, task: &TaskId) -> Result<(), ClusterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_parse() {
        assert_eq!(TaskState::parse("running"), TaskState::Running);
        assert_eq!(TaskState::parse("PENDING"), TaskState::Queued);
        assert_eq!(TaskState::parse("finished"), TaskState::Done);
        assert_eq!(TaskState::parse("gibberish"), TaskState::Unknown);
    }

    #[test]
    fn test_cpu_ratio() {
        let status = TaskStatus {
            state: TaskState::Running,
            elapsed: Duration::from_secs(300),
            cpu_time: Duration::from_secs(1),
        };
        assert!(status.cpu_ratio() < 0.01);

        let fresh = TaskStatus {
            state: TaskState::Running,
            elapsed: Duration::ZERO,
            cpu_time: Duration::ZERO,
        };
        assert_eq!(fresh.cpu_ratio(), 1.0);
    }

    #[test]
    fn test_member_handles() {
        let base = TaskId("4711".to_string());
        assert_eq!(base.member(3).0, "4711[3]");
    }
}
