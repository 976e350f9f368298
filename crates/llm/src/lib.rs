//! Lexbrief LLM
//!
//! Provides a unified interface for interacting with the model providers the
//! pipeline can fall back between:
//! - Gemini (Google Generative Language API)
//! - Ollama (local inference)
//!
//! Also includes the HTTP client factory and HTTP error mapping helpers.

pub mod gemini;
pub mod http_client;
pub mod ollama;
pub mod provider;
pub mod types;

// Re-export main types
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use ollama::OllamaProvider;
pub use provider::{missing_api_key_error, parse_http_error, ModelProvider};
pub use types::*;

use std::sync::Arc;

/// Construct the provider for a config.
pub fn build_provider(config: ProviderConfig) -> ProviderResult<Arc<dyn ModelProvider>> {
    match config.provider {
        ProviderKind::Gemini => Ok(Arc::new(GeminiProvider::new(config)?)),
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(config)?)),
    }
}
