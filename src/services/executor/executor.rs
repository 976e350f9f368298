//! Task Executor
//!
//! Runs a plan's tasks one at a time against a shared result bag. Each task
//! passes a dependency gate and its skip check before its handler runs; a
//! failure is recorded in the bag and only its dependents are skipped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use lexbrief_core::{
    ErrorKind, PipelineError, PipelineResult, ResultBag, TaskId, TaskResult, TaskStatus, UPSTREAM_FAILED,
    UPSTREAM_MISSING,
};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::citation::CitationNormalizer;
use super::payload::{
    citation_strings, fill_word_count, validate_payload, FieldSchema, BRIEF_SCHEMA,
    EXTRACTION_SCHEMA,
};
use crate::models::settings::ScoringConfig;
use crate::services::gateway::{ModelGateway, ModelRequest, ModelResponse};
use crate::services::planner::{spec, ExecutionPlan, TaskHandler, TaskSpec};
use crate::services::preferences::PreferenceSet;
use crate::services::prompt::{PromptStore, STRICT_JSON_SUFFIX};
use crate::utils::text::truncate_chars;

/// Temperature of the retry after an unparseable answer.
pub const RETRY_TEMPERATURE: f64 = 0.1;
/// Documents longer than this are cut before prompting.
pub const DEFAULT_MAX_DOCUMENT_CHARS: usize = 50_000;

/// Executes planned tasks in order.
pub struct TaskExecutor {
    gateway: Arc<ModelGateway>,
    prompts: Arc<PromptStore>,
    normalizer: CitationNormalizer,
    scoring: ScoringConfig,
    max_document_chars: usize,
}

impl TaskExecutor {
    pub fn new(gateway: Arc<ModelGateway>, prompts: Arc<PromptStore>) -> Self {
        Self {
            gateway,
            prompts,
            normalizer: CitationNormalizer::new(),
            scoring: ScoringConfig::default(),
            max_document_chars: DEFAULT_MAX_DOCUMENT_CHARS,
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_max_document_chars(mut self, max_chars: usize) -> Self {
        self.max_document_chars = max_chars;
        self
    }

    /// Run every task in `plan`. The returned bag starts from `prior`, so
    /// earlier results stay visible to dependents and to the caller.
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        document_text: &str,
        prefs: &PreferenceSet,
        prior: ResultBag,
    ) -> ResultBag {
        let mut bag = prior;

        for planned in &plan.tasks {
            let task_spec = spec(planned.id);
            let result = self.run_task(task_spec, document_text, prefs, &bag).await;
            match result.status {
                TaskStatus::Success => info!(
                    task = %planned.id,
                    confidence = result.confidence,
                    validation_errors = result.validation_errors.len(),
                    "Task succeeded"
                ),
                TaskStatus::Skipped => info!(
                    task = %planned.id,
                    reason = result.reason.as_deref().unwrap_or(""),
                    "Task skipped"
                ),
                TaskStatus::Failed => match failure_class(result.error_kind) {
                    "configuration" => error!(
                        task = %planned.id,
                        reason = result.reason.as_deref().unwrap_or(""),
                        "Task failed on a configuration problem; check templates and settings"
                    ),
                    class => warn!(
                        task = %planned.id,
                        class,
                        reason = result.reason.as_deref().unwrap_or(""),
                        "Task failed"
                    ),
                },
            }
            bag.insert(result);
        }

        bag
    }

    async fn run_task(
        &self,
        task_spec: &TaskSpec,
        document_text: &str,
        prefs: &PreferenceSet,
        bag: &ResultBag,
    ) -> TaskResult {
        let id = task_spec.id;

        if let Some(reason) = dependency_gate(task_spec, bag) {
            return TaskResult::skipped(id, reason);
        }
        if let Some(reason) = task_spec.skip_if.and_then(|predicate| predicate(bag, prefs)) {
            return TaskResult::skipped(id, reason);
        }

        match task_spec.handler {
            TaskHandler::Model { template } => {
                match self.run_model_task(id, template, document_text, prefs, bag).await {
                    Ok(result) => result,
                    Err(e) => TaskResult::failed(id, &e),
                }
            }
            TaskHandler::Local => match self.run_local_task(id, prefs, bag) {
                Ok(result) => result,
                Err(e) => TaskResult::failed(id, &e),
            },
            TaskHandler::External => TaskResult::skipped(
                id,
                format!("{} requires a collaborator that is not configured", id),
            ),
        }
    }

    async fn run_model_task(
        &self,
        id: TaskId,
        template: &str,
        document_text: &str,
        prefs: &PreferenceSet,
        bag: &ResultBag,
    ) -> PipelineResult<TaskResult> {
        let variables = self.task_variables(id, document_text, prefs, bag)?;
        let prompt = self.prompts.format(template, &variables)?;

        let started = Instant::now();
        let (parsed, response) = self.call_with_retry(id, &prompt, prefs).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let schema: &FieldSchema = match id {
            TaskId::Brief => &BRIEF_SCHEMA,
            _ => &EXTRACTION_SCHEMA,
        };
        let validated = validate_payload(parsed, schema, &self.scoring);
        let mut payload = validated.payload;
        if id == TaskId::Brief {
            if !prefs.citation.include_citations_in_brief {
                if let Some(map) = payload.as_object_mut() {
                    map.insert("key_citations".to_string(), Value::Array(Vec::new()));
                }
            }
            fill_word_count(&mut payload);
        }

        Ok(TaskResult::success(id, payload, validated.confidence)
            .with_validation_errors(validated.errors)
            .with_provider(response.provider_used, latency_ms))
    }

    /// One model call, retried once with a stricter prompt when the answer
    /// is not valid JSON. Other errors are returned as-is.
    async fn call_with_retry(
        &self,
        id: TaskId,
        prompt: &str,
        prefs: &PreferenceSet,
    ) -> PipelineResult<(Map<String, Value>, ModelResponse)> {
        match self.gateway.infer_json(&ModelRequest::new(prompt), prefs).await {
            Err(PipelineError::ResponseParse(message)) => {
                warn!(task = %id, error = %message, "Unparseable model output, retrying with strict prompt");
                let suffix = self.prompts.format(STRICT_JSON_SUFFIX, &HashMap::new())?;
                let strict = ModelRequest::new(format!("{}{}", prompt, suffix))
                    .with_temperature(RETRY_TEMPERATURE);
                self.gateway.infer_json(&strict, prefs).await
            }
            other => other,
        }
    }

    fn run_local_task(
        &self,
        id: TaskId,
        prefs: &PreferenceSet,
        bag: &ResultBag,
    ) -> PipelineResult<TaskResult> {
        match id {
            TaskId::NormalizeCitations => {
                let extraction = bag.payload(TaskId::Extract).ok_or_else(|| {
                    PipelineError::validation("extraction output missing for citation normalization")
                })?;
                let citations = citation_strings(extraction);
                let (payload, errors) = self.normalizer.normalize(&citations, prefs.citation.format);
                let confidence = mean_citation_confidence(&payload);
                debug!(
                    processed = citations.len(),
                    unrecognized = errors.len(),
                    format = %prefs.citation.format,
                    "Citations normalized"
                );
                Ok(TaskResult::success(id, payload, confidence).with_validation_errors(errors))
            }
            other => Err(PipelineError::config(format!(
                "no local handler for task {}",
                other
            ))),
        }
    }

    /// Template variables for a model task.
    fn task_variables(
        &self,
        id: TaskId,
        document_text: &str,
        prefs: &PreferenceSet,
        bag: &ResultBag,
    ) -> PipelineResult<HashMap<&'static str, String>> {
        let mut vars = HashMap::new();
        vars.insert("language", prefs.general.language.clone());

        match id {
            TaskId::Extract => {
                let (document, truncated) = truncate_chars(document_text, self.max_document_chars);
                if truncated {
                    warn!(
                        max_chars = self.max_document_chars,
                        "Document truncated before extraction"
                    );
                }
                vars.insert("document_text", document);
            }
            TaskId::Brief => {
                let extraction = bag.payload(TaskId::Extract).ok_or_else(|| {
                    PipelineError::validation("extraction output missing for brief generation")
                })?;
                let verbosity = prefs.general.verbosity_level;
                vars.insert("max_words", verbosity.brief_word_limit().to_string());
                vars.insert("verbosity", verbosity.to_string());
                vars.insert("citation_format", prefs.citation.format.to_string());
                vars.insert(
                    "citation_instruction",
                    citation_instruction(prefs).to_string(),
                );
                for field in [
                    "case_name",
                    "court",
                    "date",
                    "facts",
                    "legal_issues",
                    "holdings",
                    "reasoning",
                    "disposition",
                ] {
                    vars.insert(field, field_text(extraction.get(field)));
                }

                // Prefer citations already rewritten in the requested style
                let citations = bag
                    .payload(TaskId::NormalizeCitations)
                    .and_then(|p| p.get("citations"))
                    .map(|c| field_text(Some(c)))
                    .unwrap_or_else(|| citation_strings(extraction).join("; "));
                let citations = if prefs.citation.include_citations_in_brief {
                    if citations.is_empty() {
                        "None".to_string()
                    } else {
                        citations
                    }
                } else {
                    "Omitted".to_string()
                };
                vars.insert("citations", citations);
            }
            other => {
                return Err(PipelineError::config(format!(
                    "task {} has no prompt variables",
                    other
                )))
            }
        }

        Ok(vars)
    }
}

/// How a task failure is reported: configuration problems need an operator,
/// transient ones may pass on a later run.
fn failure_class(kind: Option<ErrorKind>) -> &'static str {
    match kind {
        Some(kind) if kind.is_configuration() => "configuration",
        Some(kind) if kind.is_transient() => "transient",
        _ => "permanent",
    }
}

/// Reason to skip a task because of its dependencies, if any.
fn dependency_gate(task_spec: &TaskSpec, bag: &ResultBag) -> Option<&'static str> {
    for dep in task_spec.depends_on {
        match bag.get(*dep) {
            None => return Some(UPSTREAM_MISSING),
            Some(result) if result.blocks_dependents() => return Some(UPSTREAM_FAILED),
            Some(_) => {}
        }
    }
    None
}

fn citation_instruction(prefs: &PreferenceSet) -> &'static str {
    if prefs.citation.include_citations_in_brief {
        "List the most important citations under key_citations, formatted in the citation style above."
    } else {
        "Do not cite authorities; return an empty key_citations list."
    }
}

/// Prompt text for an extracted field; arrays are joined with "; ".
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => super::payload::NOT_FOUND.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .filter(|s| !s.trim().is_empty())
                .collect();
            parts.join("; ")
        }
        Some(other) => other.to_string(),
    }
}

fn mean_citation_confidence(payload: &Value) -> f64 {
    let scores: Vec<f64> = payload
        .get("normalized_citations")
        .and_then(|c| c.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|c| c.get("confidence").and_then(|v| v.as_f64()))
                .collect()
        })
        .unwrap_or_default();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
