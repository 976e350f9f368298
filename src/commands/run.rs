//! Run Command
//!
//! Reads a document, merges per-run preference overrides over the stored
//! ones, and runs the pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use lexbrief_core::ResultBag;
use serde_json::Value;
use tracing::{debug, info};

use crate::services::pipeline::{PipelineOutcome, PipelineRequest};
use crate::services::preferences::store::merge_json;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Arguments of one `run` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Document to analyze
    pub input: PathBuf,
    /// What the user asks for, e.g. "summarize this opinion"
    pub request: Option<String>,
    /// JSON object of preference overrides for this run only
    pub overrides: Option<String>,
    /// File holding results of an earlier run
    pub prior: Option<PathBuf>,
}

/// Pair the user's instruction with the document; a blank instruction is dropped.
pub fn build_request(document: String, request: Option<&str>) -> PipelineRequest {
    match request.map(str::trim).filter(|r| !r.is_empty()) {
        Some(instruction) => PipelineRequest::new(instruction, document),
        None => PipelineRequest::document(document),
    }
}

/// Parse per-run overrides; must be a JSON object when present.
pub fn parse_overrides(raw: Option<&str>) -> AppResult<Option<Value>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw)? {
        value @ Value::Object(_) => Ok(Some(value)),
        _ => Err(AppError::validation("overrides must be a JSON object")),
    }
}

/// Load prior results from a file. Accepts a bare result bag, a run outcome,
/// or the CLI's printed response envelope.
pub fn load_prior(path: &Path) -> AppResult<ResultBag> {
    if !path.exists() {
        return Err(AppError::not_found(format!(
            "prior results file {}",
            path.display()
        )));
    }
    let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let bag = value
        .pointer("/data/results")
        .or_else(|| value.get("results"))
        .unwrap_or(&value);
    let bag: ResultBag = serde_json::from_value(bag.clone())?;
    debug!(path = %path.display(), results = bag.len(), "Loaded prior results");
    Ok(bag)
}

/// Run the pipeline for one document.
pub async fn run_document(state: &AppState, request: &RunRequest) -> AppResult<PipelineOutcome> {
    let document = fs::read_to_string(&request.input)?;
    let pipeline_request = build_request(document, request.request.as_deref());

    let mut overrides = state.preferences().load_overrides()?;
    if let Some(per_run) = parse_overrides(request.overrides.as_deref())? {
        merge_json(&mut overrides, &per_run);
    }
    let prior = request.prior.as_deref().map(load_prior).transpose()?;

    info!(
        input = %request.input.display(),
        chars = pipeline_request.document.chars().count(),
        instruction = %pipeline_request.planning_text(),
        has_prior = prior.is_some(),
        "Running pipeline"
    );
    let pipeline = state.pipeline()?;
    Ok(pipeline.run_pipeline(&pipeline_request, &overrides, prior).await?)
}
