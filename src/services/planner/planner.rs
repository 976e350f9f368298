//! Execution Planner
//!
//! Decides which tasks run for a request and in what order. A model proposes
//! a sequence first; any failure along that path (no provider, unparseable
//! answer, invalid order) falls through to the deterministic rule-based plan.
//! Callers only learn which path ran from the plan's rationale and strategy.

use std::collections::HashMap;
use std::sync::Arc;

use lexbrief_core::{PipelineError, PipelineResult, ResultBag, TaskId};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::task_table::{self, spec};
use super::types::{ExecutionPlan, PlanStrategy, PlannedTask};
use super::validator::{sequence_summary, validate_sequence};
use crate::services::gateway::{read_confidence, ModelGateway, ModelRequest};
use crate::services::preferences::PreferenceSet;
use crate::services::prompt::{self, PromptStore};
use crate::utils::text::truncate_chars;

/// Confidence of every rule-based plan.
pub const RULE_BASED_CONFIDENCE: f64 = 0.7;
/// Confidence assumed when a model plan omits one.
const DEFAULT_MODEL_CONFIDENCE: f64 = 0.5;
/// The planning prompt only needs the gist of the request.
const PLANNING_REQUEST_CHARS: usize = 4_000;
/// Planning wants a stable answer, not a creative one.
const PLANNING_TEMPERATURE: f64 = 0.2;

const BRIEF_KEYWORDS: [&str; 4] = ["brief", "summary", "summarize", "summarise"];

/// Task order the rule-based planner starts from.
const RULE_BASE_ORDER: [TaskId; 3] = [TaskId::Extract, TaskId::Brief, TaskId::NormalizeCitations];

/// Plans requests; model-assisted when a gateway is attached and enabled.
pub struct ExecutionPlanner {
    gateway: Option<Arc<ModelGateway>>,
    prompts: Arc<PromptStore>,
    model_assisted: bool,
}

impl ExecutionPlanner {
    /// Planner that always uses the rule-based path.
    pub fn rule_based(prompts: Arc<PromptStore>) -> Self {
        Self {
            gateway: None,
            prompts,
            model_assisted: false,
        }
    }

    pub fn new(gateway: Arc<ModelGateway>, prompts: Arc<PromptStore>, model_assisted: bool) -> Self {
        Self {
            gateway: Some(gateway),
            prompts,
            model_assisted,
        }
    }

    /// Build the plan for one request. Never fails.
    pub async fn plan(&self, request: &str, prefs: &PreferenceSet, prior: &ResultBag) -> ExecutionPlan {
        if let (true, Some(gateway)) = (self.model_assisted, self.gateway.as_ref()) {
            match self.model_plan(gateway, request, prefs, prior).await {
                Ok(plan) => {
                    info!(
                        tasks = %sequence_summary(&plan.task_ids()),
                        confidence = plan.confidence,
                        "Using model-assisted plan"
                    );
                    return plan;
                }
                Err(e) => {
                    warn!(error = %e, "Model-assisted planning failed, using rule-based plan");
                    let mut plan = rule_based_plan(request, prefs, prior);
                    plan.rationale = format!(
                        "{} (model-assisted planning failed: {})",
                        plan.rationale, e
                    );
                    return plan;
                }
            }
        }

        let plan = rule_based_plan(request, prefs, prior);
        info!(tasks = %sequence_summary(&plan.task_ids()), "Using rule-based plan");
        plan
    }

    async fn model_plan(
        &self,
        gateway: &ModelGateway,
        request: &str,
        prefs: &PreferenceSet,
        prior: &ResultBag,
    ) -> PipelineResult<ExecutionPlan> {
        let (request_excerpt, _) = truncate_chars(request, PLANNING_REQUEST_CHARS);
        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("task_catalogue", task_table::catalogue());
        vars.insert("preferences", prefs.prompt_summary());
        vars.insert("request", request_excerpt);
        let prompt_text = self.prompts.format(prompt::ORCHESTRATION, &vars)?;

        let model_request = ModelRequest::new(prompt_text).with_temperature(PLANNING_TEMPERATURE);
        let (parsed, response) = gateway.infer_json(&model_request, prefs).await?;
        debug!(provider = %response.provider_used, "Received planning response");

        let proposal = parse_model_plan(&parsed)?;
        validate_sequence(&proposal.sequence, prior)?;

        let rationale = format!(
            "model-assisted plan from {}: {}",
            response.provider_used,
            if proposal.analysis.is_empty() {
                "no analysis given".to_string()
            } else {
                proposal.analysis.clone()
            }
        );
        let confidence = proposal.confidence.unwrap_or(DEFAULT_MODEL_CONFIDENCE);
        Ok(finalize(
            proposal.sequence,
            prefs,
            prior,
            confidence,
            rationale,
            PlanStrategy::ModelAssisted,
        ))
    }
}

/// What a model proposed before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPlanProposal {
    pub sequence: Vec<TaskId>,
    pub confidence: Option<f64>,
    pub analysis: String,
}

/// Read `execution_sequence` (or `selected_agents`) from a planning response.
///
/// Entries may be task names or objects naming one under `task`, `agent` or `name`.
pub fn parse_model_plan(parsed: &Map<String, Value>) -> PipelineResult<ModelPlanProposal> {
    let entries = parsed
        .get("execution_sequence")
        .or_else(|| parsed.get("selected_agents"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            PipelineError::plan_validation("response has no 'execution_sequence' array")
        })?;

    let mut sequence = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = match entry {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => ["task", "agent", "name"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(|v| v.as_str())),
            _ => None,
        }
        .ok_or_else(|| PipelineError::plan_validation(format!("unreadable plan entry {}", entry)))?;

        let id = TaskId::from_name(name)
            .ok_or_else(|| PipelineError::plan_validation(format!("unknown task '{}'", name)))?;
        sequence.push(id);
    }

    Ok(ModelPlanProposal {
        sequence,
        confidence: read_confidence(parsed.get("confidence")),
        analysis: parsed
            .get("analysis")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string(),
    })
}

/// Whether the request text asks for a brief.
pub fn requests_brief(request: &str) -> bool {
    let lower = request.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| BRIEF_KEYWORDS.contains(&word))
}

/// Deterministic plan: extract, then brief when asked for, then citation
/// normalization unless disabled.
pub fn rule_based_plan(request: &str, prefs: &PreferenceSet, prior: &ResultBag) -> ExecutionPlan {
    let wants_brief = requests_brief(request) || prefs.general.auto_generate_brief;
    let mut notes = Vec::new();

    let sequence: Vec<TaskId> = RULE_BASE_ORDER
        .iter()
        .copied()
        .filter(|id| match id {
            TaskId::Brief if !wants_brief => {
                notes.push("brief not requested".to_string());
                false
            }
            _ => true,
        })
        .collect();

    finalize(
        sequence,
        prefs,
        prior,
        RULE_BASED_CONFIDENCE,
        format!("rule-based plan{}", join_notes(&notes)),
        PlanStrategy::RuleBased,
    )
}

/// Shared tail of both strategies: drop tasks that already succeeded or that
/// preferences disable, and mark tasks whose skip check must wait for output.
fn finalize(
    sequence: Vec<TaskId>,
    prefs: &PreferenceSet,
    prior: &ResultBag,
    confidence: f64,
    rationale: String,
    strategy: PlanStrategy,
) -> ExecutionPlan {
    let mut notes = Vec::new();
    let mut tasks = Vec::with_capacity(sequence.len());

    for id in sequence {
        if prior.succeeded(id) {
            notes.push(format!("{} reused from prior results", id));
            continue;
        }
        if id == TaskId::NormalizeCitations && !prefs.citation.normalize_citations {
            notes.push("citation normalization disabled by preferences".to_string());
            continue;
        }
        tasks.push(PlannedTask {
            id,
            provisional: spec(id).lazy_skip,
        });
    }

    let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
    ExecutionPlan {
        tasks,
        confidence: confidence.clamp(0.0, 1.0),
        rationale: format!(
            "{}{}; sequence: {}",
            rationale,
            join_notes(&notes),
            sequence_summary(&ids)
        ),
        strategy,
    }
}

fn join_notes(notes: &[String]) -> String {
    if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join("; "))
    }
}
