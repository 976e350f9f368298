//! Task Identity and Result Types
//!
//! The closed set of tasks the pipeline knows how to run, the status of a
//! finished task, and the per-request [`ResultBag`] that later tasks read from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::citation_strings;
use crate::error::{ErrorKind, PipelineError};

// ============================================================================
// Task Identity
// ============================================================================

/// Every task the pipeline can plan. Adding a task means adding a variant here
/// and an entry in the static task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    Extract,
    Brief,
    NormalizeCitations,
    RetrieveCases,
    Compare,
}

impl TaskId {
    pub const ALL: [TaskId; 5] = [
        TaskId::Extract,
        TaskId::Brief,
        TaskId::NormalizeCitations,
        TaskId::RetrieveCases,
        TaskId::Compare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Extract => "extract",
            TaskId::Brief => "brief",
            TaskId::NormalizeCitations => "normalize_citations",
            TaskId::RetrieveCases => "retrieve_cases",
            TaskId::Compare => "compare",
        }
    }

    /// Resolve a task name as a model might write it.
    ///
    /// Accepts the canonical id as well as the agent-style names
    /// (`legal_extractor`, `brief_generator`, ...), case-insensitively.
    pub fn from_name(name: &str) -> Option<TaskId> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "extract" | "extraction" | "legal_extractor" | "extractor" => Some(TaskId::Extract),
            "brief" | "brief_generator" | "generate_brief" => Some(TaskId::Brief),
            "normalize_citations" | "citation_normalizer" | "citations" => {
                Some(TaskId::NormalizeCitations)
            }
            "retrieve_cases" | "case_retriever" | "retriever" => Some(TaskId::RetrieveCases),
            "compare" | "comparator" | "compare_cases" => Some(TaskId::Compare),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Task Results
// ============================================================================

/// Terminal status of one task within one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failed,
    Skipped,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Reason recorded when a task is skipped because a dependency failed.
pub const UPSTREAM_FAILED: &str = "upstream dependency failed";

/// Reason recorded when a dependency never ran and no prior result covers it.
pub const UPSTREAM_MISSING: &str = "upstream dependency missing";

/// Outcome of a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    /// Why a task was skipped or failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl TaskResult {
    pub fn success(task_id: TaskId, payload: serde_json::Value, confidence: f64) -> Self {
        Self {
            task_id,
            status: TaskStatus::Success,
            payload,
            confidence: confidence.clamp(0.0, 1.0),
            validation_errors: Vec::new(),
            reason: None,
            error_kind: None,
            provider_used: None,
            latency_ms: None,
        }
    }

    pub fn failed(task_id: TaskId, error: &PipelineError) -> Self {
        Self {
            task_id,
            status: TaskStatus::Failed,
            payload: serde_json::Value::Null,
            confidence: 0.0,
            validation_errors: Vec::new(),
            reason: Some(error.to_string()),
            error_kind: Some(error.kind()),
            provider_used: None,
            latency_ms: None,
        }
    }

    pub fn skipped(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Skipped,
            payload: serde_json::Value::Null,
            confidence: 0.0,
            validation_errors: Vec::new(),
            reason: Some(reason.into()),
            error_kind: None,
            provider_used: None,
            latency_ms: None,
        }
    }

    pub fn with_validation_errors(mut self, errors: Vec<String>) -> Self {
        self.validation_errors = errors;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>, latency_ms: u64) -> Self {
        self.provider_used = Some(provider.into());
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }

    /// True when this result should block its dependents: a failure, or a skip
    /// that was itself caused by an upstream failure.
    pub fn blocks_dependents(&self) -> bool {
        match self.status {
            TaskStatus::Failed => true,
            TaskStatus::Skipped => matches!(
                self.reason.as_deref(),
                Some(UPSTREAM_FAILED) | Some(UPSTREAM_MISSING)
            ),
            TaskStatus::Success => false,
        }
    }
}

// ============================================================================
// Result Bag
// ============================================================================

/// Per-request accumulator of task outcomes, keyed by task id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultBag {
    results: BTreeMap<TaskId, TaskResult>,
}

impl ResultBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result, replacing any earlier result for the same task.
    pub fn insert(&mut self, result: TaskResult) {
        self.results.insert(result.task_id, result);
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskResult> {
        self.results.get(&id)
    }

    /// Payload of a task, only when it succeeded.
    pub fn payload(&self, id: TaskId) -> Option<&serde_json::Value> {
        self.get(id).filter(|r| r.is_success()).map(|r| &r.payload)
    }

    pub fn succeeded(&self, id: TaskId) -> bool {
        self.get(id).map(|r| r.is_success()).unwrap_or(false)
    }

    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.get(id).map(|r| r.status)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.values()
    }

    /// Number of citations an extraction result produced, if extraction succeeded.
    /// Counts what citation normalization would process.
    pub fn extracted_citation_count(&self) -> Option<usize> {
        self.payload(TaskId::Extract)
            .map(|payload| citation_strings(payload).len())
    }
}

impl FromIterator<TaskResult> for ResultBag {
    fn from_iter<I: IntoIterator<Item = TaskResult>>(iter: I) -> Self {
        let mut bag = ResultBag::new();
        for result in iter {
            bag.insert(result);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_id_from_name_accepts_aliases() {
        assert_eq!(TaskId::from_name("extract"), Some(TaskId::Extract));
        assert_eq!(TaskId::from_name("legal_extractor"), Some(TaskId::Extract));
        assert_eq!(TaskId::from_name("Brief_Generator"), Some(TaskId::Brief));
        assert_eq!(
            TaskId::from_name("citation-normalizer"),
            Some(TaskId::NormalizeCitations)
        );
        assert_eq!(TaskId::from_name("case_retriever"), Some(TaskId::RetrieveCases));
        assert_eq!(TaskId::from_name("comparator"), Some(TaskId::Compare));
        assert_eq!(TaskId::from_name("translate"), None);
    }

    #[test]
    fn test_task_id_serde_matches_as_str() {
        for id in TaskId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn test_skipped_by_upstream_blocks_dependents() {
        let skipped = TaskResult::skipped(TaskId::Brief, UPSTREAM_FAILED);
        assert!(skipped.blocks_dependents());

        let skipped = TaskResult::skipped(TaskId::NormalizeCitations, "no citations extracted");
        assert!(!skipped.blocks_dependents());

        let failed = TaskResult::failed(TaskId::Extract, &PipelineError::response_parse("bad"));
        assert!(failed.blocks_dependents());
        assert_eq!(failed.error_kind, Some(ErrorKind::ResponseParseError));
    }

    #[test]
    fn test_success_clamps_confidence() {
        let result = TaskResult::success(TaskId::Extract, json!({}), 1.7);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_bag_payload_only_for_success() {
        let mut bag = ResultBag::new();
        bag.insert(TaskResult::success(
            TaskId::Extract,
            json!({"citations": ["410 U.S. 113", "", "347 U.S. 483"]}),
            0.9,
        ));
        bag.insert(TaskResult::skipped(TaskId::Brief, "not requested"));

        assert!(bag.payload(TaskId::Extract).is_some());
        assert!(bag.payload(TaskId::Brief).is_none());
        assert_eq!(bag.extracted_citation_count(), Some(2));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_placeholder_citations_count_as_none() {
        let mut bag = ResultBag::new();
        bag.insert(TaskResult::success(
            TaskId::Extract,
            json!({"citations": ["Not found"]}),
            0.6,
        ));
        assert_eq!(bag.extracted_citation_count(), Some(0));

        let mut bag = ResultBag::new();
        bag.insert(TaskResult::success(TaskId::Extract, json!({"citations": [42]}), 0.6));
        assert_eq!(bag.extracted_citation_count(), Some(1));
    }

    #[test]
    fn test_bag_serializes_as_map() {
        let bag: ResultBag = vec![TaskResult::skipped(TaskId::Compare, "no retrieved cases")]
            .into_iter()
            .collect();
        let value = serde_json::to_value(&bag).unwrap();
        assert_eq!(value["compare"]["status"], "skipped");

        let back: ResultBag = serde_json::from_value(value).unwrap();
        assert_eq!(back, bag);
    }
}
