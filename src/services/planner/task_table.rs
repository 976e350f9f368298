//! Static Task Table
//!
//! Every task's dependencies, skip condition and handler kind, defined once.
//! Adding a task means adding a `TaskId` variant and an entry here.

use lexbrief_core::{ResultBag, TaskId};

use crate::services::preferences::PreferenceSet;
use crate::services::prompt;

/// Returns a skip reason when the task should not run.
pub type SkipPredicate = fn(&ResultBag, &PreferenceSet) -> Option<String>;

/// How a task produces its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskHandler {
    /// Prompted model call rendered from the named template
    Model { template: &'static str },
    /// Deterministic local computation
    Local,
    /// Requires a collaborator outside the core
    External,
}

#[derive(Clone, Copy)]
pub struct TaskSpec {
    pub id: TaskId,
    pub depends_on: &'static [TaskId],
    pub skip_if: Option<SkipPredicate>,
    /// `skip_if` reads task output, so it can only be settled at execution time
    pub lazy_skip: bool,
    pub handler: TaskHandler,
    pub description: &'static str,
}

fn skip_normalize_citations(results: &ResultBag, prefs: &PreferenceSet) -> Option<String> {
    if !prefs.citation.normalize_citations {
        return Some("citation normalization disabled by preferences".to_string());
    }
    match results.extracted_citation_count() {
        Some(0) => Some("no citations extracted".to_string()),
        _ => None,
    }
}

fn skip_retrieve_cases(_: &ResultBag, _: &PreferenceSet) -> Option<String> {
    Some("case retrieval requires an external case-law service".to_string())
}

fn skip_compare(results: &ResultBag, _: &PreferenceSet) -> Option<String> {
    let has_cases = results
        .payload(TaskId::RetrieveCases)
        .and_then(|p| p.get("cases"))
        .and_then(|c| c.as_array())
        .map(|cases| !cases.is_empty())
        .unwrap_or(false);
    if has_cases {
        None
    } else {
        Some("no retrieved cases to compare".to_string())
    }
}

pub static TASK_SPECS: [TaskSpec; 5] = [
    TaskSpec {
        id: TaskId::Extract,
        depends_on: &[],
        skip_if: None,
        lazy_skip: false,
        handler: TaskHandler::Model {
            template: prompt::LEGAL_EXTRACTION,
        },
        description: "extract case name, court, facts, issues, holdings, reasoning and citations",
    },
    TaskSpec {
        id: TaskId::Brief,
        depends_on: &[TaskId::Extract],
        skip_if: None,
        lazy_skip: false,
        handler: TaskHandler::Model {
            template: prompt::BRIEF_GENERATION,
        },
        description: "write a short legal brief from the extracted fields",
    },
    TaskSpec {
        id: TaskId::NormalizeCitations,
        depends_on: &[TaskId::Extract],
        skip_if: Some(skip_normalize_citations),
        lazy_skip: true,
        handler: TaskHandler::Local,
        description: "rewrite extracted citations in the preferred citation style",
    },
    TaskSpec {
        id: TaskId::RetrieveCases,
        depends_on: &[TaskId::Extract],
        skip_if: Some(skip_retrieve_cases),
        lazy_skip: false,
        handler: TaskHandler::External,
        description: "find similar cases and precedents",
    },
    TaskSpec {
        id: TaskId::Compare,
        depends_on: &[TaskId::Extract, TaskId::RetrieveCases],
        skip_if: Some(skip_compare),
        lazy_skip: true,
        handler: TaskHandler::External,
        description: "compare the case against retrieved precedents",
    },
];

/// Spec for a task. Every `TaskId` has exactly one entry.
pub fn spec(id: TaskId) -> &'static TaskSpec {
    match id {
        TaskId::Extract => &TASK_SPECS[0],
        TaskId::Brief => &TASK_SPECS[1],
        TaskId::NormalizeCitations => &TASK_SPECS[2],
        TaskId::RetrieveCases => &TASK_SPECS[3],
        TaskId::Compare => &TASK_SPECS[4],
    }
}

/// One line per task, for the planning prompt.
pub fn catalogue() -> String {
    TASK_SPECS
        .iter()
        .map(|s| {
            let deps: Vec<&str> = s.depends_on.iter().map(|d| d.as_str()).collect();
            format!(
                "- {}: {} (depends on: [{}])",
                s.id,
                s.description,
                deps.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Kahn's algorithm over the static table. `None` means the table has a cycle.
pub fn topological_order() -> Option<Vec<TaskId>> {
    let mut in_degree: Vec<usize> = TASK_SPECS.iter().map(|s| s.depends_on.len()).collect();
    let mut order = Vec::with_capacity(TASK_SPECS.len());
    let mut ready: Vec<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();

    while let Some(i) = ready.pop() {
        let done = TASK_SPECS[i].id;
        order.push(done);
        for (j, spec) in TASK_SPECS.iter().enumerate() {
            if spec.depends_on.contains(&done) {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(j);
                }
            }
        }
    }

    (order.len() == TASK_SPECS.len()).then_some(order)
}
