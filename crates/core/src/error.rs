//! Core Error Types
//!
//! Defines the pipeline error taxonomy shared across the lexbrief workspace.
//! These error types are dependency-free (only thiserror + serde) to keep the
//! core crate lightweight.
//!
//! The main application crate adds its own `AppError` for configuration and
//! storage I/O; everything that happens while serving a request is expressed
//! as a `PipelineError`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TemplateNotFound,
    TemplateFormatError,
    NoModelAvailable,
    ResponseParseError,
    Timeout,
    PlanValidationError,
    ValidationError,
    ConfigError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TemplateNotFound => "template_not_found",
            ErrorKind::TemplateFormatError => "template_format_error",
            ErrorKind::NoModelAvailable => "no_model_available",
            ErrorKind::ResponseParseError => "response_parse_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::PlanValidationError => "plan_validation_error",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::ConfigError => "config_error",
        }
    }

    /// Configuration-class errors are fixed by changing deployment, not by retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ErrorKind::TemplateNotFound | ErrorKind::TemplateFormatError | ErrorKind::ConfigError
        )
    }

    /// Transient errors may succeed on a later request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::NoModelAvailable | ErrorKind::ResponseParseError | ErrorKind::Timeout
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single provider could not serve a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

fn summarize_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.provider, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error type for everything that can go wrong while serving one request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A task asked for a prompt template that was never loaded
    #[error("Template not found: {key}")]
    TemplateNotFound { key: String },

    /// A template could not be rendered with the supplied variables
    #[error("Template format error in '{key}': {message}")]
    TemplateFormat { key: String, message: String },

    /// Every eligible provider failed or was unavailable
    #[error("No model available ({})", summarize_failures(.failures))]
    NoModelAvailable { failures: Vec<ProviderFailure> },

    /// Model output could not be parsed into the expected structure
    #[error("Response parse error: {0}")]
    ResponseParse(String),

    /// An operation exceeded its deadline
    #[error("Timed out after {elapsed_ms}ms: {operation}")]
    Timeout { operation: String, elapsed_ms: u64 },

    /// A proposed execution plan was rejected
    #[error("Plan validation error: {0}")]
    PlanValidation(String),

    /// Input or output failed structural validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Startup or deployment configuration is wrong
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for pipeline errors
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn template_not_found(key: impl Into<String>) -> Self {
        Self::TemplateNotFound { key: key.into() }
    }

    pub fn template_format(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateFormat {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn no_model_available(failures: Vec<ProviderFailure>) -> Self {
        Self::NoModelAvailable { failures }
    }

    pub fn response_parse(msg: impl Into<String>) -> Self {
        Self::ResponseParse(msg.into())
    }

    pub fn timeout(operation: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms,
        }
    }

    pub fn plan_validation(msg: impl Into<String>) -> Self {
        Self::PlanValidation(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::TemplateNotFound { .. } => ErrorKind::TemplateNotFound,
            PipelineError::TemplateFormat { .. } => ErrorKind::TemplateFormatError,
            PipelineError::NoModelAvailable { .. } => ErrorKind::NoModelAvailable,
            PipelineError::ResponseParse(_) => ErrorKind::ResponseParseError,
            PipelineError::Timeout { .. } => ErrorKind::Timeout,
            PipelineError::PlanValidation(_) => ErrorKind::PlanValidationError,
            PipelineError::Validation(_) => ErrorKind::ValidationError,
            PipelineError::Config(_) => ErrorKind::ConfigError,
        }
    }
}

/// Convert PipelineError to a string
impl From<PipelineError> for String {
    fn from(err: PipelineError) -> String {
        err.to_string()
    }
}
