//! Provider Fallback Chain
//!
//! Tries providers in order, bounding each attempt with a timeout and
//! recording every attempt. The first success wins.

use std::time::{Duration, Instant};

use lexbrief_core::ProviderFailure;
use lexbrief_llm::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Reasons a provider attempt can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Provider is not available/configured
    Unavailable,
    /// Provider timed out
    Timeout,
    /// Provider answered with a non-success HTTP status
    HttpStatus,
    /// Rate limited
    RateLimited,
    /// Network/connection error
    NetworkError,
    /// Malformed response payload
    InvalidResponse,
    /// Provider answered with no text
    Empty,
    /// Anything else
    Error,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Unavailable => write!(f, "unavailable"),
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::HttpStatus => write!(f, "http_status"),
            FailureReason::RateLimited => write!(f, "rate_limited"),
            FailureReason::NetworkError => write!(f, "network_error"),
            FailureReason::InvalidResponse => write!(f, "invalid_response"),
            FailureReason::Empty => write!(f, "empty"),
            FailureReason::Error => write!(f, "error"),
        }
    }
}

impl FailureReason {
    /// Classify a provider error into a failure reason
    pub fn from_provider_error(err: &ProviderError) -> Self {
        match err {
            ProviderError::ProviderUnavailable { .. } => FailureReason::Unavailable,
            ProviderError::AuthenticationFailed { .. } => FailureReason::Unavailable,
            ProviderError::Timeout { .. } => FailureReason::Timeout,
            ProviderError::RateLimited { .. } => FailureReason::RateLimited,
            ProviderError::ModelNotFound { .. }
            | ProviderError::InvalidRequest { .. }
            | ProviderError::ServerError { .. } => FailureReason::HttpStatus,
            ProviderError::NetworkError { .. } => FailureReason::NetworkError,
            ProviderError::ParseError { .. } => FailureReason::InvalidResponse,
            ProviderError::EmptyResponse => FailureReason::Empty,
            ProviderError::Other { .. } => FailureReason::Error,
        }
    }
}

/// Errors from fallback execution
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("All providers in fallback chain failed")]
    AllProvidersFailed(FallbackExecutionLog),

    #[error("No providers eligible for this call")]
    NoProviders,
}

/// Result type for fallback operations
pub type FallbackResult<T> = Result<T, FallbackError>;

/// Configuration for fallback behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Timeout per attempt in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_per_attempt_ms: u64,
    /// Whether to log all attempts
    #[serde(default = "default_log_attempts")]
    pub log_all_attempts: bool,
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_log_attempts() -> bool {
    true
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            timeout_per_attempt_ms: default_timeout_ms(),
            log_all_attempts: default_log_attempts(),
        }
    }
}

impl FallbackConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_per_attempt_ms: timeout.as_millis() as u64,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_per_attempt_ms)
    }
}

/// Record of a single provider attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackAttempt {
    /// Provider that was tried
    pub provider: String,
    /// Whether this attempt succeeded
    pub success: bool,
    /// Failure reason if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Duration of the attempt in milliseconds
    pub duration_ms: u64,
    /// Timestamp when attempt started
    pub started_at: String,
}

impl FallbackAttempt {
    /// Create a successful attempt record
    pub fn success(provider: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            provider: provider.into(),
            success: true,
            failure_reason: None,
            error_message: None,
            duration_ms,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a failed attempt record
    pub fn failure(
        provider: impl Into<String>,
        reason: FailureReason,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            provider: provider.into(),
            success: false,
            failure_reason: Some(reason),
            error_message: Some(error.into()),
            duration_ms,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Log of all attempts made for one call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackExecutionLog {
    /// All attempts made
    pub attempts: Vec<FallbackAttempt>,
    /// Total duration in milliseconds
    pub total_duration_ms: u64,
    /// Provider that succeeded (if any)
    pub successful_provider: Option<String>,
    /// Whether execution ultimately succeeded
    pub overall_success: bool,
}

impl FallbackExecutionLog {
    /// Create a new log
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attempt to the log
    pub fn add_attempt(&mut self, attempt: FallbackAttempt) {
        self.total_duration_ms += attempt.duration_ms;
        if attempt.success {
            self.successful_provider = Some(attempt.provider.clone());
            self.overall_success = true;
        }
        self.attempts.push(attempt);
    }

    /// Get the number of failed attempts before success
    pub fn failed_attempts_count(&self) -> usize {
        self.attempts.iter().filter(|a| !a.success).count()
    }

    /// Per-provider failure reasons, in attempt order.
    pub fn failures(&self) -> Vec<ProviderFailure> {
        self.attempts
            .iter()
            .filter(|a| !a.success)
            .map(|a| {
                let reason = match (&a.failure_reason, &a.error_message) {
                    (Some(r), Some(m)) => format!("{} ({})", r, m),
                    (Some(r), None) => r.to_string(),
                    (None, Some(m)) => m.clone(),
                    (None, None) => "failed".to_string(),
                };
                ProviderFailure::new(&a.provider, reason)
            })
            .collect()
    }
}

/// Provider Fallback Chain
///
/// Ordered list of provider names with a per-attempt timeout.
#[derive(Debug, Clone)]
pub struct ProviderFallbackChain {
    providers: Vec<String>,
    config: FallbackConfig,
}

impl ProviderFallbackChain {
    /// Create a chain over the given providers, tried in order
    pub fn new(providers: Vec<String>) -> Self {
        Self {
            providers,
            config: FallbackConfig::default(),
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: FallbackConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute with fallback support
    ///
    /// Tries each provider in order until one succeeds. The executor receives
    /// the provider name and the per-attempt timeout. An attempt that outlives
    /// the timeout is cancelled and recorded as a timeout.
    pub async fn execute_with_fallback<F, Fut, T>(
        &self,
        mut executor: F,
    ) -> FallbackResult<(T, FallbackExecutionLog)>
    where
        F: FnMut(String, Duration) -> Fut,
        Fut: std::future::Future<Output = Result<T, ProviderError>>,
    {
        if self.providers.is_empty() {
            return Err(FallbackError::NoProviders);
        }

        let mut log = FallbackExecutionLog::new();
        let timeout = self.config.timeout();

        for provider in &self.providers {
            if self.config.log_all_attempts {
                info!(provider = %provider, "Attempting model call");
            }
            let attempt_start = Instant::now();

            let outcome = match tokio::time::timeout(timeout, executor(provider.clone(), timeout)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout {
                    elapsed_ms: timeout.as_millis() as u64,
                }),
            };
            let duration_ms = attempt_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    info!(provider = %provider, duration_ms, "Model call succeeded");
                    log.add_attempt(FallbackAttempt::success(provider, duration_ms));
                    return Ok((result, log));
                }
                Err(e) => {
                    let reason = FailureReason::from_provider_error(&e);
                    warn!(
                        provider = %provider,
                        reason = %reason,
                        error = %e,
                        "Model call failed"
                    );
                    log.add_attempt(FallbackAttempt::failure(
                        provider,
                        reason,
                        e.to_string(),
                        duration_ms,
                    ));
                }
            }
        }

        error!(
            attempts = log.attempts.len(),
            "All providers in fallback chain failed"
        );
        Err(FallbackError::AllProvidersFailed(log))
    }
}
