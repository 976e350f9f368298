//! Lexbrief - Legal Document Analysis Pipeline
//!
//! Plans and runs the analysis of a legal document: structured extraction,
//! brief generation and citation normalization, with model calls routed
//! through a gateway that falls back between providers.
//! It includes:
//! - CLI command handlers
//! - The pipeline services (prompts, gateway, preferences, planner, executor)
//! - Storage layer (config file, preference overrides)
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::response::CommandResponse;
pub use models::settings::{RuntimeSettings, ScoringConfig};
pub use services::pipeline::{Pipeline, PipelineOutcome, PipelineRequest};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
