//! Trivial in-process backend

use async_trait::async_trait;
use tracing::warn;

use fanout_config::BackendKind;

use crate::backend::Backend;
use crate::error::EngineResult;
use crate::job::{JobBatch, JobFunction, ResultSet, RunOutcome};

/// Runs the batch as a plain loop in the dispatching process
///
/// The only backend that computes jobs itself; it creates no scratch
/// directory and spawns nothing.
pub struct SequentialBackend;

#[async_trait]
impl Backend for SequentialBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sequential
    }

    async fn run(
        &self,
        batch: &JobBatch,
        function: &dyn JobFunction,
        store: bool,
    ) -> EngineResult<RunOutcome> {
        let mut results = ResultSet::new(batch.len());

        for job in batch.jobs() {
            match function.call(&job.args) {
                Ok(value) => {
                    if store {
                        results.insert(job.index, value)?;
                    }
                }
                Err(message) => {
                    warn!(job = job.index, %message, "job failed, aborting run");
                    return Ok(RunOutcome::failure(results));
                }
            }
        }

        Ok(RunOutcome::success(results))
    }
}
