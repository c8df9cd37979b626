//! Top-level dispatch entry point

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::time::timeout;
use tracing::info;

use fanout_cluster::{CliScheduler, QueueClient, SchedulerClient};
use fanout_config::{validate_config, BackendKind, FanoutConfig};

use crate::backend::Backend;
use crate::error::{EngineError, EngineResult};
use crate::job::{JobBatch, JobFunction, ResultSet, RunOutcome};
use crate::pool::LocalPoolBackend;
use crate::queue::ClusterQueueBackend;
use crate::scheduler::ClusterSchedulerBackend;
use crate::sequential::SequentialBackend;

/// Dispatches batches to the configured backend
///
/// Owns the configuration and the optional injected cluster clients. The
/// scheduler client defaults to [`CliScheduler`] built from the scheduler
/// section; the queue client has no CLI fallback and must be injected,
/// since it wraps a live daemon connection.
pub struct DispatchEngine {
    config: FanoutConfig,
    scheduler_client: Option<Arc<dyn SchedulerClient>>,
    queue_client: Option<Arc<dyn QueueClient>>,
}

impl DispatchEngine {
    pub fn new(config: FanoutConfig) -> Self {
        Self {
            config,
            scheduler_client: None,
            queue_client: None,
        }
    }

    /// Replace the CLI-backed scheduler client, e.g. with a test double
    pub fn with_scheduler_client(mut self, client: Arc<dyn SchedulerClient>) -> Self {
        self.scheduler_client = Some(client);
        self
    }

    pub fn with_queue_client(mut self, client: Arc<dyn QueueClient>) -> Self {
        self.queue_client = Some(client);
        self
    }

    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    fn select_backend(&self) -> EngineResult<Box<dyn Backend>> {
        let dispatch = self.config.dispatch.clone();
        match dispatch.backend {
            BackendKind::Sequential => Ok(Box::new(SequentialBackend)),
            BackendKind::Pool => Ok(Box::new(LocalPoolBackend::new(
                dispatch,
                self.config.pool.clone(),
            ))),
            BackendKind::Scheduler => {
                let scheduler = self.config.scheduler.clone().ok_or_else(|| {
                    EngineError::Configuration(
                        "scheduler backend selected but no scheduler section configured".into(),
                    )
                })?;
                let client = self.scheduler_client.clone().unwrap_or_else(|| {
                    Arc::new(CliScheduler::new(&scheduler.command, &scheduler.address))
                });
                Ok(Box::new(ClusterSchedulerBackend::new(
                    dispatch, scheduler, client,
                )))
            }
            BackendKind::Queue => {
                let queue = self.config.queue.clone().ok_or_else(|| {
                    EngineError::Configuration(
                        "queue backend selected but no queue section configured".into(),
                    )
                })?;
                let client = self.queue_client.clone().ok_or_else(|| {
                    EngineError::Configuration(
                        "queue backend selected but no queue client connected".into(),
                    )
                })?;
                Ok(Box::new(ClusterQueueBackend::new(queue, client)))
            }
        }
    }

    /// Run `function` once per element of `args` and collect the results
    ///
    /// An empty batch completes immediately without touching the backend or
    /// the filesystem. With `max_run_duration` set, the whole run races a
    /// deadline and loses with [`EngineError::Timeout`].
    pub async fn run(
        &self,
        args: Vec<JsonValue>,
        function: &dyn JobFunction,
    ) -> EngineResult<RunOutcome> {
        validate_config(&self.config)?;

        if args.is_empty() {
            return Ok(RunOutcome::success(ResultSet::empty()));
        }

        let batch = JobBatch::new(args);
        let backend = self.select_backend()?;
        let store = self.config.dispatch.store;
        info!(
            backend = ?backend.kind(),
            jobs = batch.len(),
            function = function.name(),
            store,
            "dispatching batch"
        );

        match self.config.dispatch.max_run_duration {
            Some(budget) => timeout(budget, backend.run(&batch, function, store))
                .await
                .map_err(|_| EngineError::Timeout(budget))?,
            None => backend.run(&batch, function, store).await,
        }
    }
}
