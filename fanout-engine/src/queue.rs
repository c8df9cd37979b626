//! External queue daemon backend

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use fanout_cluster::{ClusterError, QueueClient, QueueJob, QueueSubmission};
use fanout_config::{BackendKind, QueueConfig};
use fanout_protocol::JobOutcome;

use crate::backend::Backend;
use crate::error::EngineResult;
use crate::job::{JobBatch, JobFunction, ResultSet, RunOutcome};

/// Submits groups of jobs to an always-on queue daemon
///
/// No filesystem protocol: the daemon and this process share a long-lived
/// connection, so completion arrives over the in-memory response channel.
/// Groups of `group` jobs ride in one submission and run daemon-side as a
/// nested sequential sub-dispatch.
pub struct ClusterQueueBackend {
    config: QueueConfig,
    client: Arc<dyn QueueClient>,
}

impl ClusterQueueBackend {
    pub fn new(config: QueueConfig, client: Arc<dyn QueueClient>) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Backend for ClusterQueueBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Queue
    }

    async fn run(
        &self,
        batch: &JobBatch,
        function: &dyn JobFunction,
        store: bool,
    ) -> EngineResult<RunOutcome> {
        let group = self.config.group.max(1);
        info!(
            jobs = batch.len(),
            group,
            daemon = %self.config.address,
            "submitting batch to queue daemon"
        );

        let submissions: Vec<QueueSubmission> = batch
            .jobs()
            .chunks(group)
            .map(|chunk| QueueSubmission {
                function: function.name().to_string(),
                jobs: chunk
                    .iter()
                    .map(|job| QueueJob {
                        index: job.index,
                        args: job.args.clone(),
                    })
                    .collect(),
                store,
            })
            .collect();

        // The daemon may not accept another submission until earlier
        // responses are drained, so submission must run concurrently with
        // the drain loop below.
        let client = Arc::clone(&self.client);
        let mut submitter = tokio::spawn(async move {
            for submission in submissions {
                client.submit(submission).await?;
            }
            Ok::<(), ClusterError>(())
        });
        let mut submitting = true;

        let mut results = ResultSet::new(batch.len());
        let mut completed = 0usize;
        while completed < batch.len() {
            tokio::select! {
                res = &mut submitter, if submitting => {
                    submitting = false;
                    match res {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => return Err(e.into()),
                        // A torn-down submitter leaves the rendezvous dead
                        Err(_) => return Err(ClusterError::ChannelClosed.into()),
                    }
                }
                response = self.client.next_response() => {
                    let response = response?;
                    completed += 1;
                    match response.outcome {
                        JobOutcome::Error { message } => {
                            warn!(job = response.index, %message, "job failed, aborting run");
                            submitter.abort();
                            return Ok(RunOutcome::failure(results));
                        }
                        JobOutcome::Success { value } => {
                            if let Some(value) = value {
                                results.insert(response.index, value)?;
                            }
                            debug!(job = response.index, completed, "collected job");
                        }
                    }
                }
            }
        }

        Ok(RunOutcome::success(results))
    }
}
