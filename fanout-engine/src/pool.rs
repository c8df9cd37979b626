//! Bounded local process pool backend

use std::collections::BTreeSet;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use fanout_config::{BackendKind, DispatchConfig, PoolConfig};
use fanout_protocol::{JobDir, JobFile, JobInput, JobOutcome};

use crate::backend::Backend;
use crate::error::{EngineError, EngineResult};
use crate::job::{JobBatch, JobFunction, ResultSet, RunOutcome};

/// Runs jobs as independent local processes, at most `Q` in flight
///
/// `Q` is the configured override or the detected core count. Workers are
/// spawned detached and report only through the job-file protocol: a worker
/// that crashes before writing `done` leaves its slot occupied forever, so
/// the run waits until the engine-level run budget (if any) expires. That
/// mirrors the absence of any liveness signal from a detached process.
pub struct LocalPoolBackend {
    dispatch: DispatchConfig,
    pool: PoolConfig,
}

impl LocalPoolBackend {
    pub fn new(dispatch: DispatchConfig, pool: PoolConfig) -> Self {
        Self { dispatch, pool }
    }

    fn slots(&self) -> usize {
        self.pool.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    fn spawn_worker(&self, dir: &JobDir, function: &str, id: u64) -> EngineResult<Child> {
        Command::new(&self.pool.worker_path)
            .arg(function)
            .arg(dir.root())
            .arg(dir.file_id(id))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                EngineError::Worker(format!(
                    "failed to spawn {}: {}",
                    self.pool.worker_path.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl Backend for LocalPoolBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Pool
    }

    async fn run(
        &self,
        batch: &JobBatch,
        function: &dyn JobFunction,
        store: bool,
    ) -> EngineResult<RunOutcome> {
        let slots = self.slots();
        let dir = JobDir::create(&self.dispatch.share_dir, batch.len() as u64).await?;
        info!(
            jobs = batch.len(),
            slots,
            dir = %dir.root().display(),
            "starting local pool run"
        );

        let mut children: Vec<Child> = Vec::with_capacity(batch.len());
        let mut results = ResultSet::new(batch.len());
        let mut collected: BTreeSet<u64> = BTreeSet::new();
        let mut launched = 0usize;
        let mut running = 0usize;
        let mut completed = 0usize;

        while completed < batch.len() {
            // Admission control: top the pool up to its slot bound
            while running < slots && launched < batch.len() {
                let job = &batch.jobs()[launched];
                dir.write_input(job.index, &JobInput::new(job.args.clone(), store))
                    .await?;
                children.push(self.spawn_worker(&dir, function.name(), job.index)?);
                launched += 1;
                running += 1;
                debug!(job = job.index, running, "launched worker");
            }

            for id in dir.scan(JobFile::Done).await? {
                if !collected.insert(id) {
                    continue;
                }
                running -= 1;
                completed += 1;

                match dir.read_output(id).await? {
                    Some(JobOutcome::Error { message }) => {
                        warn!(job = id, %message, "job failed, aborting run");
                        dir.remove_all().await;
                        return Ok(RunOutcome::failure(results));
                    }
                    Some(JobOutcome::Success { value }) => {
                        if let Some(value) = value {
                            results.insert(id, value)?;
                        }
                    }
                    // Non-storing success writes no output file
                    None => {}
                }
                dir.remove_job(id).await?;
                debug!(job = id, completed, "collected job");
            }

            if completed < batch.len() {
                sleep(self.dispatch.poll_interval).await;
            }
        }

        // All done markers were observed, so the workers have exited
        for mut child in children {
            let _ = child.wait().await;
        }
        dir.remove_all().await;
        Ok(RunOutcome::success(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_bound_defaults_to_cores() {
        let backend = LocalPoolBackend::new(DispatchConfig::default(), PoolConfig::default());
        assert_eq!(backend.slots(), num_cpus::get());

        let backend = LocalPoolBackend::new(
            DispatchConfig::default(),
            PoolConfig {
                workers: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(backend.slots(), 2);
    }

    #[tokio::test]
    async fn test_missing_worker_executable_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalPoolBackend::new(
            DispatchConfig {
                share_dir: tmp.path().to_path_buf(),
                ..Default::default()
            },
            PoolConfig {
                workers: Some(1),
                worker_path: "definitely-not-a-worker".into(),
            },
        );

        let batch = JobBatch::new(vec![serde_json::json!(1)]);
        let f = crate::job::FnJob::new("identity", |v: &serde_json::Value| Ok(v.clone()));
        let result = backend.run(&batch, &f, true).await;
        assert!(matches!(result, Err(EngineError::Worker(_))));
    }
}
