//! Gemini Provider
//!
//! Implementation of the ModelProvider trait for Google's Generative
//! Language API (`models/{model}:generateContent`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{map_transport_error, missing_api_key_error, parse_http_error, ModelProvider};
use super::types::{ProviderConfig, ProviderError, ProviderResult};
use crate::http_client::build_http_client;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = build_http_client(CONNECT_TIMEOUT)?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url().trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the request body for the API
    fn build_request_body(&self, prompt: &str, temperature: f32) -> serde_json::Value {
        serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": self.config.max_tokens,
            }
        })
    }

    /// Concatenate the text parts of the first candidate.
    fn parse_response(response: &GeminiResponse) -> ProviderResult<String> {
        let text: String = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn is_available(&self) -> bool {
        self.config.has_api_key()
    }

    async fn call(
        &self,
        prompt: &str,
        temperature: f32,
        timeout: Duration,
    ) -> ProviderResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing_api_key_error("gemini"))?;

        let body = self.build_request_body(prompt, temperature);

        let response = self
            .client
            .post(self.endpoint())
            .timeout(timeout)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "gemini"));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&body_text).map_err(|e| ProviderError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Self::parse_response(&gemini_response)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
