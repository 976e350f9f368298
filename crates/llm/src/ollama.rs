//! Ollama Provider
//!
//! Implementation of the ModelProvider trait for a local Ollama server
//! using the ollama-rs native SDK.

use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;

use super::provider::ModelProvider;
use super::types::{ProviderConfig, ProviderError, ProviderResult};
use crate::http_client::build_http_client;

const OLLAMA_DEFAULT_PORT: u16 = 11434;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound for the liveness probe against `/api/tags`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Ollama provider
pub struct OllamaProvider {
    config: ProviderConfig,
    client: Ollama,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given configuration
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = Self::create_client(config.base_url())?;
        Ok(Self { config, client })
    }

    /// Create an Ollama SDK client from a base URL string.
    ///
    /// `Ollama::new` takes host and port separately, so the URL is split here.
    fn create_client(base_url: &str) -> ProviderResult<Ollama> {
        let parsed = url::Url::parse(base_url).map_err(|e| ProviderError::InvalidRequest {
            message: format!("invalid Ollama base URL '{}': {}", base_url, e),
        })?;
        let host = parsed.host_str().unwrap_or("localhost");
        let port = parsed.port().unwrap_or(OLLAMA_DEFAULT_PORT);
        let host_url = format!("{}://{}", parsed.scheme(), host);
        let http_client = build_http_client(CONNECT_TIMEOUT)?;
        Ok(Ollama::new_with_client(host_url, port, http_client))
    }

    fn map_error(&self, msg: String) -> ProviderError {
        if msg.contains("connect") || msg.contains("Connection refused") {
            ProviderError::ProviderUnavailable {
                message: format!("Cannot connect to Ollama at {}: {}", self.config.base_url(), msg),
            }
        } else if msg.contains("not found") || msg.contains("404") {
            ProviderError::ModelNotFound {
                model: self.config.model.clone(),
            }
        } else {
            ProviderError::NetworkError { message: msg }
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn is_available(&self) -> bool {
        // Use the SDK's list_local_models (GET /api/tags) as a health check
        match tokio::time::timeout(PROBE_TIMEOUT, self.client.list_local_models()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Ollama health check failed");
                false
            }
            Err(_) => {
                tracing::debug!("Ollama health check timed out");
                false
            }
        }
    }

    async fn call(
        &self,
        prompt: &str,
        temperature: f32,
        timeout: Duration,
    ) -> ProviderResult<String> {
        let options = ModelOptions::default()
            .temperature(temperature)
            .num_predict(self.config.max_tokens as i32);
        let request = ChatMessageRequest::new(
            self.config.model.clone(),
            vec![ChatMessage::user(prompt.to_string())],
        )
        .options(options);

        let response = tokio::time::timeout(timeout, self.client.send_chat_messages(request))
            .await
            .map_err(|_| ProviderError::Timeout {
                elapsed_ms: timeout.as_millis() as u64,
            })?
            .map_err(|e| self.map_error(e.to_string()))?;

        let text = response.message.content;
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}
