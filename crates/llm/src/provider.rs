//! Model Provider Trait
//!
//! Defines the common interface for all model providers.

use std::time::Duration;

use async_trait::async_trait;

use super::types::{ProviderError, ProviderResult};

/// Trait that all model providers must implement.
///
/// A provider answers a single text prompt with raw text. Parsing the text
/// into structured output is the caller's job.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the provider name as referenced by preferences (`"gemini"`, `"ollama"`).
    fn name(&self) -> &str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Cheap reachability check.
    ///
    /// For API providers, this only checks that credentials are configured.
    /// For Ollama, this checks if the server is running.
    async fn is_available(&self) -> bool;

    /// Send a prompt and get the complete response text.
    ///
    /// `timeout` bounds the network call. Implementations must never return
    /// an empty string as success; use [`ProviderError::EmptyResponse`].
    async fn call(&self, prompt: &str, temperature: f32, timeout: Duration)
        -> ProviderResult<String>;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> ProviderError {
    ProviderError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> ProviderError {
    match status {
        401 => ProviderError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => ProviderError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => ProviderError::ModelNotFound {
            model: body.to_string(),
        },
        429 => ProviderError::RateLimited {
            message: body.to_string(),
        },
        400 => ProviderError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => ProviderError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => ProviderError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Map a reqwest transport error onto a provider error.
pub fn map_transport_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            elapsed_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() {
        ProviderError::ProviderUnavailable {
            message: err.to_string(),
        }
    } else {
        ProviderError::NetworkError {
            message: err.to_string(),
        }
    }
}
