//! Job batch and result collection types

use serde_json::Value as JsonValue;

use crate::error::{EngineError, EngineResult};

/// One unit of independent work, identified by its 1-based submission index
#[derive(Debug, Clone)]
pub struct Job {
    pub index: u64,
    pub args: JsonValue,
}

/// An ordered batch of jobs; indices run `1..=len`
#[derive(Debug, Clone)]
pub struct JobBatch {
    jobs: Vec<Job>,
}

impl JobBatch {
    pub fn new(args: Vec<JsonValue>) -> Self {
        let jobs = args
            .into_iter()
            .enumerate()
            .map(|(i, args)| Job {
                index: i as u64 + 1,
                args,
            })
            .collect();
        Self { jobs }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// All indices in submission order
    pub fn indices(&self) -> Vec<u64> {
        self.jobs.iter().map(|j| j.index).collect()
    }
}

/// The function a batch evaluates
///
/// `name` is the token out-of-process workers use to locate the function;
/// `Err` from `call` is the per-job execution error that fails the run.
pub trait JobFunction: Send + Sync {
    fn name(&self) -> &str;
    fn call(&self, args: &JsonValue) -> Result<JsonValue, String>;
}

/// Adapter turning a plain closure into a [`JobFunction`]
pub struct FnJob<F> {
    name: String,
    f: F,
}

impl<F> FnJob<F>
where
    F: Fn(&JsonValue) -> Result<JsonValue, String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> JobFunction for FnJob<F>
where
    F: Fn(&JsonValue) -> Result<JsonValue, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: &JsonValue) -> Result<JsonValue, String> {
        (self.f)(args)
    }
}

/// Fixed-size ordered result collection, indexed by job index
///
/// Filled in completion order, not submission order; unset slots stay `None`
/// when results are not stored or a run aborts early.
#[derive(Debug)]
pub struct ResultSet {
    slots: Vec<Option<JsonValue>>,
}

impl ResultSet {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn empty() -> Self {
        Self::new(0)
    }

    /// Record one job's value; at most one write per index
    pub fn insert(&mut self, index: u64, value: JsonValue) -> EngineResult<()> {
        if index == 0 || index as usize > self.slots.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        let slot = &mut self.slots[index as usize - 1];
        if slot.is_some() {
            return Err(EngineError::DuplicateResult(index));
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn get(&self, index: u64) -> Option<&JsonValue> {
        self.slots.get(index.checked_sub(1)? as usize)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots that hold a value
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn into_values(self) -> Vec<Option<JsonValue>> {
        self.slots
    }
}

/// Overall outcome of one engine run
#[derive(Debug)]
pub struct RunOutcome {
    /// False as soon as any job reports an execution error
    pub success: bool,
    /// Per-index results; partial on failure
    pub results: ResultSet,
}

impl RunOutcome {
    pub fn success(results: ResultSet) -> Self {
        Self {
            success: true,
            results,
        }
    }

    pub fn failure(results: ResultSet) -> Self {
        Self {
            success: false,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_indices_are_one_based() {
        let batch = JobBatch::new(vec![json!(10), json!(20)]);
        assert_eq!(batch.indices(), vec![1, 2]);
        assert_eq!(batch.jobs()[0].args, json!(10));
    }

    #[test]
    fn test_result_set_insert_at_most_once() {
        let mut results = ResultSet::new(3);
        results.insert(2, json!("a")).unwrap();
        assert!(matches!(
            results.insert(2, json!("b")),
            Err(EngineError::DuplicateResult(2))
        ));
        assert_eq!(results.get(2), Some(&json!("a")));
        assert_eq!(results.filled(), 1);
    }

    #[test]
    fn test_result_set_rejects_out_of_range() {
        let mut results = ResultSet::new(3);
        assert!(matches!(
            results.insert(0, json!(1)),
            Err(EngineError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            results.insert(4, json!(1)),
            Err(EngineError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_fn_job_adapter() {
        let f = FnJob::new("double", |args: &JsonValue| {
            Ok(json!(args.as_i64().unwrap_or(0) * 2))
        });
        assert_eq!(f.name(), "double");
        assert_eq!(f.call(&json!(21)).unwrap(), json!(42));
    }
}
