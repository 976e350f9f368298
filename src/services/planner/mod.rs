//! Execution Planner
//!
//! Static task table, plan validation, and the two planning strategies
//! behind a single `plan` entry point.

pub mod planner;
pub mod task_table;
pub mod types;
pub mod validator;

pub use planner::{rule_based_plan, ExecutionPlanner};
pub use task_table::{spec, TaskHandler, TaskSpec, TASK_SPECS};
pub use types::{ExecutionPlan, PlanStrategy, PlannedTask};
pub use validator::validate_sequence;
