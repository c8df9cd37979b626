//! Cluster scheduler backend with stall watchdog

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use fanout_cluster::{SchedulerClient, TaskId};
use fanout_config::{BackendKind, DispatchConfig, SchedulerConfig};
use fanout_protocol::{JobDir, JobFile, JobInput, JobOutcome};

use crate::backend::Backend;
use crate::error::EngineResult;
use crate::job::{JobBatch, JobFunction, ResultSet, RunOutcome};
use crate::watchdog::{self, Checkpoint};

/// Slots held back from the hint so the scheduler's own management
/// processes are never starved
const SLOT_HEADROOM: usize = 2;

/// Submits jobs as tasks to an external batch scheduler and reclaims the
/// ones that hang on broken nodes
///
/// Remote tasks run outside this process's control; the only liveness
/// signal is scheduler-reported state, which can lie about a zombie. The
/// watchdog therefore compares consumed cpu time against elapsed wall time
/// and resubmits tasks that are "running" but not computing.
pub struct ClusterSchedulerBackend {
    dispatch: DispatchConfig,
    config: SchedulerConfig,
    client: Arc<dyn SchedulerClient>,
}

impl ClusterSchedulerBackend {
    pub fn new(
        dispatch: DispatchConfig,
        config: SchedulerConfig,
        client: Arc<dyn SchedulerClient>,
    ) -> Self {
        Self {
            dispatch,
            config,
            client,
        }
    }

    /// Submit `ids` (ascending), bounding every scheduler request to
    /// `max_tasks_per_submission` and preferring one parametric task per
    /// strictly contiguous range
    async fn submit_ids(
        &self,
        dir: &JobDir,
        function: &str,
        ids: &[u64],
        slots_hint: usize,
        tasks: &mut HashMap<u64, TaskId>,
    ) -> EngineResult<()> {
        let max = self.config.max_tasks_per_submission.max(1);
        for chunk in ids.chunks(max) {
            if chunk.len() > 1 && is_contiguous(chunk) {
                let (first, last) = (chunk[0], chunk[chunk.len() - 1]);
                let base = self
                    .client
                    .submit_range(
                        dir.root(),
                        &self.config.worker_path,
                        function,
                        first,
                        last,
                        slots_hint,
                    )
                    .await?;
                debug!(task = %base, first, last, "submitted parametric task");
                for &id in chunk {
                    tasks.insert(id, base.member(id));
                }
            } else {
                for &id in chunk {
                    let task = self
                        .client
                        .submit_single(
                            dir.root(),
                            &self.config.worker_path,
                            function,
                            id,
                            slots_hint,
                        )
                        .await?;
                    debug!(task = %task, job = id, "submitted single task");
                    tasks.insert(id, task);
                }
            }
        }
        Ok(())
    }

    /// One watchdog pass: query every pending task and resubmit the stalled
    /// ones; returns how many were resubmitted
    async fn watchdog_pass(
        &self,
        dir: &JobDir,
        function: &str,
        slots_hint: usize,
        tasks: &mut HashMap<u64, TaskId>,
    ) -> EngineResult<u64> {
        let mut resubmitted = 0;
        let pending: Vec<u64> = tasks.keys().copied().collect();

        for id in pending {
            let Some(task) = tasks.get(&id).cloned() else {
                continue;
            };
            let status = match self.client.task_status(&task).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(job = id, task = %task, error = %e, "status query failed, skipping");
                    continue;
                }
            };
            if !watchdog::is_stalled(&status, self.config.stall_grace, self.config.stall_cpu_threshold)
            {
                continue;
            }

            warn!(
                job = id,
                task = %task,
                elapsed = ?status.elapsed,
                cpu = ?status.cpu_time,
                "task stalled, canceling and resubmitting"
            );
            self.client.cancel(&task).await?;
            // Replaces only this id's handle; accounting for every other id
            // is untouched
            self.submit_ids(dir, function, &[id], slots_hint, tasks).await?;
            resubmitted += 1;
        }
        Ok(resubmitted)
    }
}

#[async_trait]
impl Backend for ClusterSchedulerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Scheduler
    }

    async fn run(
        &self,
        batch: &JobBatch,
        function: &dyn JobFunction,
        store: bool,
    ) -> EngineResult<RunOutcome> {
        let dir = JobDir::create(&self.dispatch.share_dir, batch.len() as u64).await?;

        for job in batch.jobs() {
            dir.write_input(job.index, &JobInput::new(job.args.clone(), store))
                .await?;
        }

        let slots = self.client.total_slots().await?;
        let slots_hint = slots.saturating_sub(SLOT_HEADROOM).clamp(1, batch.len().max(1));
        let ids = batch.indices();
        let mut tasks: HashMap<u64, TaskId> = HashMap::new();
        self.submit_ids(&dir, function.name(), &ids, slots_hint, &mut tasks)
            .await?;
        info!(
            jobs = batch.len(),
            slots,
            slots_hint,
            dir = %dir.root().display(),
            "submitted batch to scheduler"
        );

        let mut results = ResultSet::new(batch.len());
        let mut collected: BTreeSet<u64> = BTreeSet::new();
        let mut completed = 0usize;
        let mut resubmitted = 0u64;
        let mut last_watchdog = Instant::now();

        while completed < batch.len() {
            for id in dir.scan(JobFile::Done).await? {
                if !collected.insert(id) {
                    continue;
                }
                completed += 1;
                tasks.remove(&id);

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
                    None => {}
                }
                dir.remove_job(id).await?;
                debug!(job = id, completed, "collected job");
            }

            if completed == batch.len() {
                break;
            }

            if last_watchdog.elapsed() >= self.config.watchdog_interval {
                resubmitted += self
                    .watchdog_pass(&dir, function.name(), slots_hint, &mut tasks)
                    .await?;
                watchdog::write_checkpoint(&dir, &Checkpoint::new(&tasks, completed, resubmitted))
                    .await?;
                last_watchdog = Instant::now();
            }

            sleep(self.dispatch.poll_interval).await;
        }

        dir.remove_all().await;
        Ok(RunOutcome::success(results))
    }
}

/// Strict contiguity; the eligibility condition for a parametric submission
fn is_contiguous(ids: &[u64]) -> bool {
    ids.windows(2).all(|w| w[1] == w[0] + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_cluster::MockSchedulerClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn backend(client: MockSchedulerClient, max_tasks: usize) -> ClusterSchedulerBackend {
        ClusterSchedulerBackend::new(
            DispatchConfig::default(),
            SchedulerConfig {
                max_tasks_per_submission: max_tasks,
                ..Default::default()
            },
            Arc::new(client),
        )
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous(&[1, 2, 3]));
        assert!(is_contiguous(&[7]));
        assert!(!is_contiguous(&[1, 2, 4]));
    }

    #[tokio::test]
    async fn test_contiguous_ids_split_into_parametric_batches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut client = MockSchedulerClient::new();
        client
            .expect_submit_range()
            .times(3)
            .withf(move |_, _, _, first, last, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                matches!((*first, *last), (1, 4) | (5, 8) | (9, 10))
            })
            .returning(|_, _, _, first, _, _| Ok(TaskId(format!("t{}", first))));
        client.expect_submit_single().never();

        let backend = backend(client, 4);
        let tmp = tempfile::tempdir().unwrap();
        let dir = JobDir::create(tmp.path(), 10).await.unwrap();

        let ids: Vec<u64> = (1..=10).collect();
        let mut tasks = HashMap::new();
        backend
            .submit_ids(&dir, "square", &ids, 4, &mut tasks)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.len(), 10);
        // Members of a parametric task carry bracketed handles
        assert_eq!(tasks.get(&2).unwrap().0, "t1[2]");
        assert_eq!(tasks.get(&9).unwrap().0, "t9[9]");
    }

    #[tokio::test]
    async fn test_non_contiguous_ids_fall_back_to_single_submissions() {
        let mut client = MockSchedulerClient::new();
        client.expect_submit_range().never();
        client
            .expect_submit_single()
            .times(3)
            .returning(|_, _, _, id, _| Ok(TaskId(format!("s{}", id))));

        let backend = backend(client, 64);
        let tmp = tempfile::tempdir().unwrap();
        let dir = JobDir::create(tmp.path(), 10).await.unwrap();

        let mut tasks = HashMap::new();
        backend
            .submit_ids(&dir, "square", &[1, 3, 5], 4, &mut tasks)
            .await
            .unwrap();

        assert_eq!(tasks.get(&3).unwrap().0, "s3");
    }

    #[tokio::test]
    async fn test_single_id_uses_single_submission() {
        let mut client = MockSchedulerClient::new();
        client.expect_submit_range().never();
        client
            .expect_submit_single()
            .times(1)
            .returning(|_, _, _, id, _| Ok(TaskId(format!("s{}", id))));

        let backend = backend(client, 64);
        let tmp = tempfile::tempdir().unwrap();
        let dir = JobDir::create(tmp.path(), 10).await.unwrap();

        let mut tasks = HashMap::new();
        backend
            .submit_ids(&dir, "square", &[7], 4, &mut tasks)
            .await
            .unwrap();
        assert_eq!(tasks.get(&7).unwrap().0, "s7");
    }
}
