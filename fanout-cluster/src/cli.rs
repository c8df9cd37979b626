//! CLI-backed scheduler client
//!
//! Shells out to the cluster's command-line tool for every operation:
//! `create` a job container with a core-count hint, `add` a (possibly
//! parametric-ranged) task with the protocol directory as its working
//! directory, `submit` the container, `view` a task, `cancel` a task.
//! Replies are free-text key:value blocks handled by [`crate::parse`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ClusterError;
use crate::parse::require_field;
use crate::scheduler::{SchedulerClient, TaskId, TaskState, TaskStatus};

/// Scheduler client driving the cluster's CLI tools
#[derive(Debug, Clone)]
pub struct CliScheduler {
    program: String,
    address: String,
}

impl CliScheduler {
    pub fn new(program: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            address: address.into(),
        }
    }

    async fn run_tool(&self, args: &[&str]) -> Result<String, ClusterError> {
        debug!(program = %self.program, ?args, "invoking scheduler tool");
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ClusterError::Tool {
                program: self.program.clone(),
                diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn parse_seconds(blob: &str, key: &str) -> Result<Duration, ClusterError> {
        let raw = require_field(blob, key)?;
        let seconds: u64 = raw
            .parse()
            .map_err(|_| ClusterError::Malformed(format!("{} is not a second count: '{}'", key, raw)))?;
        Ok(Duration::from_secs(seconds))
    }

    /// create + add + submit, returning the container's task handle
    async fn submit_task(
        &self,
        dir: &Path,
        worker: &Path,
        function: &str,
        range: &str,
        slots_hint: usize,
    ) -> Result<TaskId, ClusterError> {
        let cores = slots_hint.to_string();
        let created = self
            .run_tool(&["create", "--address", &self.address, "--cores", &cores])
            .await?;
        let container = require_field(&created, "container")?.to_string();

        let dir = dir.to_string_lossy();
        let worker = worker.to_string_lossy();
        self.run_tool(&[
            "add",
            "--address",
            &self.address,
            "--container",
            &container,
            "--workdir",
            &dir,
            "--range",
            range,
            "--",
            &worker,
            function,
        ])
        .await?;

        let submitted = self
            .run_tool(&["submit", "--address", &self.address, "--container", &container])
            .await?;
        let task = require_field(&submitted, "task")?;
        Ok(TaskId(task.to_string()))
    }
}

#[async_trait]
impl SchedulerClient for CliScheduler {
    async fn total_slots(&self) -> Result<usize, ClusterError> {
        let reply = self.run_tool(&["slots", "--address", &self.address]).await?;
        let raw = require_field(&reply, "slots")?;
        raw.parse()
            .map_err(|_| ClusterError::Malformed(format!("slots is not a count: '{}'", raw)))
    }

    async fn submit_range(
        &self,
        dir: &Path,
        worker: &Path,
        function: &str,
        first: u64,
        last: u64,
        slots_hint: usize,
    ) -> Result<TaskId, ClusterError> {
        let range = format!("{}-{}", first, last);
        self.submit_task(dir, worker, function, &range, slots_hint).await
    }

    async fn submit_single(
        &self,
        dir: &Path,
        worker: &Path,
        function: &str,
        id: u64,
        slots_hint: usize,
    ) -> Result<TaskId, ClusterError> {
        let range = id.to_string();
        self.submit_task(dir, worker, function, &range, slots_hint).await
    }

    async fn task_status(&self, task: &TaskId) -> Result<TaskStatus, ClusterError> {
        let reply = self
            .run_tool(&["view", "--address", &self.address, &task.0])
            .await?;
        let state = TaskState::parse(require_field(&reply, "state")?);
        let elapsed = Self::parse_seconds(&reply, "elapsed")?;
        let cpu_time = Self::parse_seconds(&reply, "cpu_time")?;
        Ok(TaskStatus {
            state,
            elapsed,
            cpu_time,
        })
    }

    async fn cancel(&self, task: &TaskId) -> Result<(), ClusterError> {
        self.run_tool(&["cancel", "--address", &self.address, &task.0])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        let blob = "elapsed: 300\ncpu_time: 1\n";
        assert_eq!(
            CliScheduler::parse_seconds(blob, "elapsed").unwrap(),
            Duration::from_secs(300)
        );
        assert!(CliScheduler::parse_seconds(blob, "memory").is_err());

        let bad = "elapsed: lots\n";
        assert!(matches!(
            CliScheduler::parse_seconds(bad, "elapsed"),
            Err(ClusterError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_tool_surfaces_io_error() {
        let client = CliScheduler::new("definitely-not-a-scheduler-tool", "localhost");
        let result = client.total_slots().await;
        assert!(matches!(result, Err(ClusterError::Io(_))));
    }
}
