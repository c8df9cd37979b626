//! Scheduler backend runs against a mocked cluster client
//!
//! The mock plays both the scheduler and the remote workers: submission
//! closures write the protocol files a worker would produce, so the
//! submit/poll/collect loop and the stall watchdog run for real.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};

use fanout_cluster::{MockSchedulerClient, TaskId, TaskState, TaskStatus};
use fanout_config::{DispatchConfig, SchedulerConfig};
use fanout_engine::{Backend, ClusterSchedulerBackend, FnJob, JobBatch, JobFunction};
use fanout_protocol::{JobInput, JobOutcome};

/// Act as the remote worker for one job id: consume its input and leave
/// `started`, `out` and (last) `done` behind
fn complete_job(dir: &Path, id: u64) {
    let file_id = format!("{:04}", id);
    let bytes = std::fs::read(dir.join(format!("{}-in", file_id))).unwrap();
    let input: JobInput = serde_json::from_slice(&bytes).unwrap();
    let n = input.args.as_i64().unwrap();

    std::fs::write(dir.join(format!("{}-started", file_id)), b"").unwrap();
    if input.store {
        let out = serde_json::to_vec(&JobOutcome::success(Some(json!(n * n)))).unwrap();
        std::fs::write(dir.join(format!("{}-out", file_id)), out).unwrap();
    }
    std::fs::write(dir.join(format!("{}-done", file_id)), b"").unwrap();
}

fn square() -> impl JobFunction {
    // Executed remotely; only the name travels
    FnJob::new("square", |v: &JsonValue| Ok(v.clone()))
}

fn dispatch_config(share_dir: &Path) -> DispatchConfig {
    DispatchConfig {
        share_dir: share_dir.to_path_buf(),
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

#[tokio::test]
async fn scheduler_splits_batch_into_bounded_parametric_tasks() {
    let tmp = tempfile::tempdir().unwrap();

    let mut client = MockSchedulerClient::new();
    client.expect_total_slots().times(1).returning(|| Ok(16));
    client
        .expect_submit_range()
        .times(2)
        .withf(|_, _, function, first, last, hint| {
            function == "square" && matches!((*first, *last), (1, 2) | (3, 4)) && *hint <= 14
        })
        .returning(|dir, _, _, first, last, _| {
            for id in first..=last {
                complete_job(dir, id);
            }
            Ok(TaskId(format!("t{}", first)))
        });
    client.expect_submit_single().never();

    let backend = ClusterSchedulerBackend::new(
        dispatch_config(tmp.path()),
        SchedulerConfig {
            max_tasks_per_submission: 2,
            ..Default::default()
        },
        Arc::new(client),
    );

    let batch = JobBatch::new((1..=4).map(|n| json!(n)).collect());
    let outcome = backend.run(&batch, &square(), true).await.unwrap();

    assert!(outcome.success);
    for i in 1..=4i64 {
        assert_eq!(outcome.results.get(i as u64), Some(&json!(i * i)));
    }
}

#[tokio::test]
async fn watchdog_cancels_and_resubmits_a_stalled_task() {
    let tmp = tempfile::tempdir().unwrap();

    // First submission stalls (writes nothing); the resubmission completes
    let submissions = Arc::new(AtomicUsize::new(0));
    let counter = submissions.clone();

    let mut client = MockSchedulerClient::new();
    client.expect_total_slots().times(1).returning(|| Ok(4));
    client.expect_submit_range().never();
    client
        .expect_submit_single()
        .times(2)
        .returning(move |dir, _, _, id, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(TaskId("t-old".to_string()))
            } else {
                complete_job(dir, id);
                Ok(TaskId("t-new".to_string()))
            }
        });
    client
        .expect_task_status()
        .withf(|task| task.0 == "t-old")
        .times(1)
        .returning(|_| {
            Ok(TaskStatus {
                state: TaskState::Running,
                elapsed: Duration::from_secs(300),
                cpu_time: Duration::from_secs(1),
            })
        });
    client
        .expect_cancel()
        .withf(|task| task.0 == "t-old")
        .times(1)
        .returning(|_| Ok(()));

    let backend = ClusterSchedulerBackend::new(
        dispatch_config(tmp.path()),
        SchedulerConfig {
            watchdog_interval: Duration::from_millis(30),
            stall_grace: Duration::from_millis(1),
            ..Default::default()
        },
        Arc::new(client),
    );

    let batch = JobBatch::new(vec![json!(6)]);
    let outcome = backend.run(&batch, &square(), true).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.results.get(1), Some(&json!(36)));
    assert_eq!(submissions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn scheduler_aborts_run_when_a_job_reports_an_error() {
    let tmp = tempfile::tempdir().unwrap();

    let mut client = MockSchedulerClient::new();
    client.expect_total_slots().times(1).returning(|| Ok(4));
    client
        .expect_submit_range()
        .times(1)
        .returning(|dir, _, _, first, last, _| {
            for id in first..=last {
                let file_id = format!("{:04}", id);
                if id == 2 {
                    let out = serde_json::to_vec(&JobOutcome::error("node fault")).unwrap();
                    std::fs::write(dir.join(format!("{}-out", file_id)), out).unwrap();
                    std::fs::write(dir.join(format!("{}-done", file_id)), b"").unwrap();
                } else {
                    complete_job(dir, id);
                }
            }
            Ok(TaskId("t1".to_string()))
        });

    let backend = ClusterSchedulerBackend::new(
        dispatch_config(tmp.path()),
        SchedulerConfig::default(),
        Arc::new(client),
    );

    let batch = JobBatch::new((1..=3).map(|n| json!(n)).collect());
    let outcome = backend.run(&batch, &square(), true).await.unwrap();

    assert!(!outcome.success);
    assert!(outcome.results.get(2).is_none());
}
