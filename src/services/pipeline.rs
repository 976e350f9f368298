//! Pipeline
//!
//! The single entry point: resolve preferences, plan, execute, all under an
//! overall deadline. Components are built once and shared across runs; each
//! run gets its own preference snapshot and result bag.

use std::sync::Arc;
use std::time::Instant;

use lexbrief_core::{PipelineError, PipelineResult, ResultBag};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::settings::RuntimeSettings;
use crate::services::executor::TaskExecutor;
use crate::services::gateway::ModelGateway;
use crate::services::planner::{ExecutionPlan, ExecutionPlanner};
use crate::services::preferences::{resolve_with_report, PreferenceSet};
use crate::services::prompt::{PromptStore, REQUIRED_KEYS};
use crate::utils::error::AppResult;

/// Planning text used when the caller gives no instruction.
pub const DEFAULT_INSTRUCTION: &str = "Analyze this legal document.";

/// One request: what the user asks for and the document it concerns.
///
/// Only the instruction drives planning. Only the document reaches the
/// extraction prompt, so words like "summary judgment" inside an opinion
/// never schedule a brief.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    #[serde(default)]
    pub instruction: String,
    pub document: String,
}

impl PipelineRequest {
    pub fn new(instruction: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            document: document.into(),
        }
    }

    /// A document with no instruction.
    pub fn document(document: impl Into<String>) -> Self {
        Self::new(String::new(), document)
    }

    /// Text the planner reads.
    pub fn planning_text(&self) -> &str {
        match self.instruction.trim() {
            "" => DEFAULT_INSTRUCTION,
            instruction => instruction,
        }
    }
}

/// What one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub run_id: String,
    pub plan: ExecutionPlan,
    pub results: ResultBag,
    /// Preferences the run used
    pub preferences: PreferenceSet,
}

pub struct Pipeline {
    settings: RuntimeSettings,
    prompts: Arc<PromptStore>,
    gateway: Arc<ModelGateway>,
    planner: ExecutionPlanner,
    executor: TaskExecutor,
}

impl Pipeline {
    /// Build every component from runtime settings.
    pub fn from_settings(settings: RuntimeSettings) -> AppResult<Self> {
        let prompts = match &settings.prompts_path {
            Some(path) => PromptStore::load_file(path)?,
            None => PromptStore::builtin(),
        };
        let gateway = ModelGateway::from_settings(&settings)?;
        Self::with_components(settings, Arc::new(prompts), Arc::new(gateway))
    }

    /// Assemble a pipeline around an existing template store and gateway.
    pub fn with_components(
        settings: RuntimeSettings,
        prompts: Arc<PromptStore>,
        gateway: Arc<ModelGateway>,
    ) -> AppResult<Self> {
        prompts.require(&REQUIRED_KEYS)?;

        let planner = ExecutionPlanner::new(
            gateway.clone(),
            prompts.clone(),
            settings.model_assisted_planning,
        );
        let executor = TaskExecutor::new(gateway.clone(), prompts.clone())
            .with_scoring(settings.scoring)
            .with_max_document_chars(settings.max_document_chars);

        info!(
            providers = ?gateway.registered_providers(),
            templates = prompts.keys().len(),
            model_assisted_planning = settings.model_assisted_planning,
            "Pipeline ready"
        );

        Ok(Self {
            settings,
            prompts,
            gateway,
            planner,
            executor,
        })
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn prompts(&self) -> &PromptStore {
        &self.prompts
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// Run one request end to end.
    ///
    /// `stored_overrides` is the raw preference overrides object; `prior`
    /// results are reused by dependents and included in the returned bag.
    pub async fn run_pipeline(
        &self,
        request: &PipelineRequest,
        stored_overrides: &Value,
        prior: Option<ResultBag>,
    ) -> PipelineResult<PipelineOutcome> {
        if request.document.trim().is_empty() {
            return Err(PipelineError::validation("document text is empty"));
        }

        let run_id = Uuid::new_v4().to_string();
        let deadline = self.settings.pipeline_deadline();
        let span = info_span!("pipeline", run_id = %run_id);

        let run = async {
            let started = Instant::now();
            let (prefs, ignored) = resolve_with_report(stored_overrides);
            if !ignored.is_empty() {
                warn!(ignored = ?ignored, "Ignored invalid preference overrides");
            }

            let prior = prior.unwrap_or_default();
            let plan = self
                .planner
                .plan(request.planning_text(), &prefs, &prior)
                .await;
            info!(
                strategy = %plan.strategy,
                tasks = plan.tasks.len(),
                confidence = plan.confidence,
                "Plan ready"
            );

            let results = self
                .executor
                .execute(&plan, &request.document, &prefs, prior)
                .await;
            info!(
                results = results.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pipeline finished"
            );

            PipelineOutcome {
                run_id: run_id.clone(),
                plan,
                results,
                preferences: prefs,
            }
        }
        .instrument(span);

        match tokio::time::timeout(deadline, run).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => {
                warn!(run_id = %run_id, deadline_secs = deadline.as_secs(), "Pipeline deadline exceeded");
                Err(PipelineError::timeout("pipeline", deadline.as_millis() as u64))
            }
        }
    }
}
