//! Plan Validation
//!
//! A plan is valid when it is non-empty, names each task at most once, and
//! places every task after all of its dependencies. A dependency that already
//! succeeded in an earlier run counts as satisfied.

use std::collections::HashSet;

use lexbrief_core::{PipelineError, PipelineResult, ResultBag, TaskId};

use super::task_table::spec;

pub fn validate_sequence(sequence: &[TaskId], prior: &ResultBag) -> PipelineResult<()> {
    if sequence.is_empty() {
        return Err(PipelineError::plan_validation("plan is empty"));
    }

    let mut seen: HashSet<TaskId> = HashSet::with_capacity(sequence.len());
    for &id in sequence {
        if !seen.insert(id) {
            return Err(PipelineError::plan_validation(format!(
                "task '{}' appears more than once",
                id
            )));
        }
        for dep in spec(id).depends_on {
            if !seen.contains(dep) && !prior.succeeded(*dep) {
                return Err(PipelineError::plan_validation(format!(
                    "task '{}' is scheduled before its dependency '{}'",
                    id, dep
                )));
            }
        }
    }
    Ok(())
}

/// Human-readable summary of a sequence, e.g. `extract -> brief`.
pub fn sequence_summary(sequence: &[TaskId]) -> String {
    if sequence.is_empty() {
        return "(no tasks)".to_string();
    }
    sequence
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
