//! Execution Plan Types

use lexbrief_core::TaskId;
use serde::{Deserialize, Serialize};

/// How a plan was produced. Informative only; execution treats both the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStrategy {
    ModelAssisted,
    RuleBased,
}

impl std::fmt::Display for PlanStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanStrategy::ModelAssisted => write!(f, "model-assisted"),
            PlanStrategy::RuleBased => write!(f, "rule-based"),
        }
    }
}

/// One entry in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTask {
    pub id: TaskId,
    /// The task's skip condition depends on output not known at plan time and
    /// is checked again right before the task runs.
    pub provisional: bool,
}

/// Ordered, validated task sequence for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub tasks: Vec<PlannedTask>,
    pub confidence: f64,
    pub rationale: String,
    pub strategy: PlanStrategy,
}

impl ExecutionPlan {
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
