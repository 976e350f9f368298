//! Services
//!
//! The pipeline and the components it is assembled from.

pub mod executor;
pub mod gateway;
pub mod pipeline;
pub mod planner;
pub mod preferences;
pub mod prompt;

pub use executor::TaskExecutor;
pub use gateway::ModelGateway;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineRequest};
pub use planner::ExecutionPlanner;
pub use prompt::PromptStore;
