//! Out-of-process worker entry point

use tracing::debug;

use fanout_protocol::{JobDir, JobOutcome};

use crate::error::EngineResult;
use crate::job::JobFunction;

/// Execute one job from its protocol files
///
/// The step order is fixed: read `input`, mark `started`, run the function,
/// write `output`, mark `done`. `done` comes last, non-negotiably, so the
/// collector never observes it before the output is visible. A worker
/// executable is a thin `main` around this: parse `(function, dir, id)`,
/// attach with [`JobDir::open`], look up the function by name, call this.
pub async fn run_worker(dir: &JobDir, id: u64, function: &dyn JobFunction) -> EngineResult<()> {
    let input = dir.read_input(id).await?;
    dir.mark_started(id).await?;
    debug!(job = id, function = function.name(), "worker started");

    let outcome = match function.call(&input.args) {
        Ok(value) => JobOutcome::success(if input.store { Some(value) } else { None }),
        Err(message) => JobOutcome::error(message),
    };

    // A non-storing success writes no output file at all; its absence under
    // a done marker is the success signal.
    if input.store || outcome.is_error() {
        dir.write_output(id, &outcome).await?;
    }
    dir.mark_done(id).await?;
    Ok(())
}
