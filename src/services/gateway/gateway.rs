//! Model Gateway
//!
//! One call interface over every registered provider. The provider order
//! comes from the preference snapshot; providers that are not registered or
//! fail their liveness probe are dropped before any call is made.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lexbrief_core::{PipelineError, PipelineResult, ProviderFailure};
use lexbrief_llm::{build_provider, ModelProvider, ProviderError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::fallback::{
    FailureReason, FallbackAttempt, FallbackConfig, FallbackError, ProviderFallbackChain,
};
use super::liveness::LivenessCache;
use super::parse::parse_json_object;
use crate::models::settings::RuntimeSettings;
use crate::services::preferences::PreferenceSet;
use crate::utils::error::{AppError, AppResult};

/// Which configured provider a request should start with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderHint {
    #[default]
    Primary,
    Fallback,
}

/// A single inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub prompt: String,
    #[serde(default)]
    pub provider_hint: ProviderHint,
    /// Overrides `llm.temperature` from the preferences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider_hint: ProviderHint::Primary,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_hint(mut self, hint: ProviderHint) -> Self {
        self.provider_hint = hint;
        self
    }
}

/// The answer to exactly one [`ModelRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub raw_text: String,
    pub provider_used: String,
    pub latency_ms: u64,
    pub attempts: Vec<FallbackAttempt>,
}

/// Uniform inference interface with ordered provider fallback.
pub struct ModelGateway {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
    liveness: Arc<LivenessCache>,
    call_timeout: Duration,
}

impl ModelGateway {
    pub fn new(call_timeout: Duration, liveness: Arc<LivenessCache>) -> Self {
        Self {
            providers: HashMap::new(),
            liveness,
            call_timeout,
        }
    }

    /// Register a provider under its own name, replacing any previous one.
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn ModelProvider>) {
        debug!(provider = provider.name(), model = provider.model(), "Registered provider");
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Build a gateway with every provider in the runtime settings.
    pub fn from_settings(settings: &RuntimeSettings) -> AppResult<Self> {
        let liveness = Arc::new(LivenessCache::new(settings.liveness_ttl()));
        let mut gateway = Self::new(settings.call_timeout(), liveness);
        for config in &settings.providers {
            let provider = build_provider(config.clone()).map_err(|e| {
                AppError::config(format!("provider '{}': {}", config.provider, e))
            })?;
            gateway.register(provider);
        }
        Ok(gateway)
    }

    pub fn registered_providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Provider names to try, in order, before liveness filtering.
    pub fn provider_order(&self, hint: ProviderHint, prefs: &PreferenceSet) -> Vec<String> {
        let primary = prefs.llm.primary_model.trim().to_ascii_lowercase();
        let fallback = prefs.llm.fallback_model.trim().to_ascii_lowercase();

        let mut order = match hint {
            ProviderHint::Primary => vec![primary.clone()],
            ProviderHint::Fallback => vec![fallback.clone()],
        };
        if prefs.llm.enable_fallback {
            let other = match hint {
                ProviderHint::Primary => fallback,
                ProviderHint::Fallback => primary,
            };
            if !order.contains(&other) {
                order.push(other);
            }
        }
        order
    }

    /// Infer with the default request options.
    pub async fn infer(&self, prompt: &str, prefs: &PreferenceSet) -> PipelineResult<ModelResponse> {
        self.infer_request(&ModelRequest::new(prompt), prefs).await
    }

    /// Try each eligible provider in order until one answers.
    pub async fn infer_request(
        &self,
        request: &ModelRequest,
        prefs: &PreferenceSet,
    ) -> PipelineResult<ModelResponse> {
        let started = Instant::now();
        let mut skipped: Vec<ProviderFailure> = Vec::new();
        let mut eligible: Vec<String> = Vec::new();

        for name in self.provider_order(request.provider_hint, prefs) {
            match self.providers.get(&name) {
                None => skipped.push(ProviderFailure::new(&name, "not registered")),
                Some(provider) => {
                    if self.liveness.is_available(provider.as_ref()).await {
                        eligible.push(name);
                    } else {
                        skipped.push(ProviderFailure::new(&name, FailureReason::Unavailable.to_string()));
                    }
                }
            }
        }

        if eligible.is_empty() {
            warn!(?skipped, "No provider eligible for model call");
            return Err(PipelineError::no_model_available(skipped));
        }

        let temperature = request.temperature.unwrap_or(prefs.llm.temperature) as f32;
        let chain = ProviderFallbackChain::new(eligible)
            .with_config(FallbackConfig::with_timeout(self.call_timeout));
        let providers = &self.providers;
        let prompt = request.prompt.as_str();

        let outcome = chain
            .execute_with_fallback(|name, timeout| {
                let provider = providers.get(&name).cloned();
                async move {
                    match provider {
                        Some(p) => p.call(prompt, temperature, timeout).await,
                        None => Err(ProviderError::ProviderUnavailable {
                            message: format!("provider '{}' is not registered", name),
                        }),
                    }
                }
            })
            .await;

        match outcome {
            Ok((raw_text, log)) => {
                let provider_used = log.successful_provider.clone().unwrap_or_default();
                let latency_ms = started.elapsed().as_millis() as u64;
                info!(
                    provider = %provider_used,
                    latency_ms,
                    failed_attempts = log.failed_attempts_count(),
                    "Model call completed"
                );
                Ok(ModelResponse {
                    raw_text,
                    provider_used,
                    latency_ms,
                    attempts: log.attempts,
                })
            }
            Err(FallbackError::AllProvidersFailed(log)) => {
                for attempt in &log.attempts {
                    if attempt.failure_reason == Some(FailureReason::Unavailable) {
                        self.liveness.record(&attempt.provider, false).await;
                    }
                }
                skipped.extend(log.failures());
                Err(PipelineError::no_model_available(skipped))
            }
            Err(FallbackError::NoProviders) => Err(PipelineError::no_model_available(skipped)),
        }
    }

    /// Infer and parse the answer as a JSON object.
    ///
    /// A parse failure is returned as-is; it does not move on to another provider.
    pub async fn infer_json(
        &self,
        request: &ModelRequest,
        prefs: &PreferenceSet,
    ) -> PipelineResult<(Map<String, Value>, ModelResponse)> {
        let response = self.infer_request(request, prefs).await?;
        let parsed = parse_json_object(&response.raw_text)?;
        Ok((parsed, response))
    }
}
