//! Backend abstraction over job execution strategies

use async_trait::async_trait;

use fanout_config::BackendKind;

use crate::error::EngineResult;
use crate::job::{JobBatch, JobFunction, RunOutcome};

/// A strategy for executing a batch of jobs
///
/// One implementation exists per [`BackendKind`]; the engine selects with a
/// single typed match, never by string tag. Implementations must execute
/// each index at most once and fill the result set at matching indices.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which config selector this backend answers to
    fn kind(&self) -> BackendKind;

    /// Execute every job in the batch and collect ordered results
    ///
    /// When `store` is false, jobs still run and failures are still
    /// detected, but result values need not be transmitted.
    async fn run(
        &self,
        batch: &JobBatch,
        function: &dyn JobFunction,
        store: bool,
    ) -> EngineResult<RunOutcome>;
}
