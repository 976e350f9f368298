//! Settings Models
//!
//! Runtime configuration stored in config.json: which providers exist, how
//! long calls may take, and how task output is scored.

use std::path::PathBuf;
use std::time::Duration;

use lexbrief_llm::{ProviderConfig, ProviderKind};
use serde::{Deserialize, Serialize};

/// Weights for combining model-reported confidence with field completeness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of the confidence the model reports about its own output
    #[serde(default = "default_model_weight")]
    pub model_weight: f64,
    /// Weight of the fraction of required fields that were populated
    #[serde(default = "default_completeness_weight")]
    pub completeness_weight: f64,
}

fn default_model_weight() -> f64 {
    0.4
}

fn default_completeness_weight() -> f64 {
    0.6
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model_weight: default_model_weight(),
            completeness_weight: default_completeness_weight(),
        }
    }
}

impl ScoringConfig {
    /// Combine both signals. Without a model-reported value, completeness alone.
    pub fn combine(&self, model_confidence: Option<f64>, completeness: f64) -> f64 {
        let completeness = completeness.clamp(0.0, 1.0);
        let score = match model_confidence {
            Some(model) => {
                let total = self.model_weight + self.completeness_weight;
                if total <= 0.0 {
                    completeness
                } else {
                    (self.model_weight * model.clamp(0.0, 1.0)
                        + self.completeness_weight * completeness)
                        / total
                }
            }
            None => completeness,
        };
        score.clamp(0.0, 1.0)
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Registered model providers, referenced by name from preferences
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    /// Upper bound for a single provider call
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Upper bound for a whole pipeline run
    #[serde(default = "default_pipeline_deadline_secs")]
    pub pipeline_deadline_secs: u64,
    /// How long a provider liveness probe stays valid
    #[serde(default = "default_liveness_ttl_secs")]
    pub liveness_ttl_secs: u64,
    /// Ask a model to plan before falling back to the rule-based plan
    #[serde(default = "default_true")]
    pub model_assisted_planning: bool,
    /// Documents longer than this are truncated before prompting
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Optional JSON file of prompt templates layered over the built-ins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_path: Option<PathBuf>,
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::for_kind(ProviderKind::Gemini),
        ProviderConfig::for_kind(ProviderKind::Ollama),
    ]
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_pipeline_deadline_secs() -> u64 {
    300
}

fn default_liveness_ttl_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_max_document_chars() -> usize {
    50_000
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            call_timeout_secs: default_call_timeout_secs(),
            pipeline_deadline_secs: default_pipeline_deadline_secs(),
            liveness_ttl_secs: default_liveness_ttl_secs(),
            model_assisted_planning: true,
            max_document_chars: default_max_document_chars(),
            scoring: ScoringConfig::default(),
            prompts_path: None,
        }
    }
}

impl RuntimeSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn pipeline_deadline(&self) -> Duration {
        Duration::from_secs(self.pipeline_deadline_secs)
    }

    pub fn liveness_ttl(&self) -> Duration {
        Duration::from_secs(self.liveness_ttl_secs)
    }

    fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        if let Some(index) = self.providers.iter().position(|p| p.provider == kind) {
            &mut self.providers[index]
        } else {
            self.providers.push(ProviderConfig::for_kind(kind));
            let last = self.providers.len() - 1;
            &mut self.providers[last]
        }
    }

    /// Apply environment overrides (`GEMINI_API_KEY`, `GEMINI_MODEL`,
    /// `OLLAMA_BASE_URL`, `OLLAMA_MODEL`). `lookup` is `std::env::var` in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.provider_mut(ProviderKind::Gemini).api_key = Some(key);
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            self.provider_mut(ProviderKind::Gemini).model = model;
        }
        if let Some(url) = non_empty("OLLAMA_BASE_URL") {
            self.provider_mut(ProviderKind::Ollama).base_url = Some(url);
        }
        if let Some(model) = non_empty("OLLAMA_MODEL") {
            self.provider_mut(ProviderKind::Ollama).model = model;
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if self.pipeline_deadline_secs < self.call_timeout_secs {
            return Err(format!(
                "pipeline_deadline_secs ({}) must be at least call_timeout_secs ({})",
                self.pipeline_deadline_secs, self.call_timeout_secs
            ));
        }
        if self.max_document_chars == 0 {
            return Err("max_document_chars must be greater than 0".to_string());
        }
        if self.scoring.model_weight < 0.0 || self.scoring.completeness_weight < 0.0 {
            return Err("scoring weights must not be negative".to_string());
        }
        if self.scoring.model_weight + self.scoring.completeness_weight <= 0.0 {
            return Err("scoring weights must not both be zero".to_string());
        }
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.model.trim().is_empty() {
                return Err(format!("providers[{}] ({}) has an empty model", i, provider.provider));
            }
            if self.providers[..i].iter().any(|p| p.provider == provider.provider) {
                return Err(format!("provider '{}' is configured twice", provider.provider));
            }
        }
        Ok(())
    }
}
