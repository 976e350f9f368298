//! Provider Types
//!
//! Configuration and error types shared by every model provider.

use serde::{Deserialize, Serialize};

/// Supported model provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Ollama,
}

impl ProviderKind {
    /// Parse a provider name as stored in preferences (`"gemini"`, `"ollama"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(ProviderKind::Gemini),
            "ollama" => Some(ProviderKind::Ollama),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::Ollama => "llama2",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

/// Configuration for a model provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider type
    pub provider: ProviderKind,
    /// API key (not needed for Ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    8192
}

impl ProviderConfig {
    /// Config with the provider's default model and endpoint.
    pub fn for_kind(provider: ProviderKind) -> Self {
        Self {
            provider,
            api_key: None,
            base_url: None,
            model: provider.default_model().to_string(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(self.provider.default_base_url())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Error types for provider calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderError {
    /// Authentication failed (invalid or missing API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited { message: String },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Response parsing error
    ParseError { message: String },
    /// The provider answered with no text
    EmptyResponse,
    /// Provider not available (e.g., Ollama not running)
    ProviderUnavailable { message: String },
    /// The call did not finish within its timeout
    Timeout { elapsed_ms: u64 },
    /// Other error
    Other { message: String },
}

impl ProviderError {
    /// HTTP status carried by the error, when there is one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProviderError::AuthenticationFailed { .. } => Some(401),
            ProviderError::RateLimited { .. } => Some(429),
            ProviderError::ModelNotFound { .. } => Some(404),
            ProviderError::InvalidRequest { .. } => Some(400),
            ProviderError::ServerError { status, .. } => *status,
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            ProviderError::RateLimited { message } => {
                write!(f, "Rate limited: {}", message)
            }
            ProviderError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            ProviderError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            ProviderError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            ProviderError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            ProviderError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            ProviderError::EmptyResponse => write!(f, "Empty response"),
            ProviderError::ProviderUnavailable { message } => {
                write!(f, "Provider unavailable: {}", message)
            }
            ProviderError::Timeout { elapsed_ms } => {
                write!(f, "Timed out after {}ms", elapsed_ms)
            }
            ProviderError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
