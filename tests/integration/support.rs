//! Shared test doubles for the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lexbrief::services::gateway::{LivenessCache, ModelGateway};
use lexbrief::services::prompt::PromptStore;
use lexbrief::{Pipeline, RuntimeSettings};
use lexbrief_llm::{ModelProvider, ProviderError, ProviderResult};
use serde_json::{json, Value};

/// How a mock provider answers.
#[derive(Clone)]
pub enum Behavior {
    /// Answer according to which prompt template was rendered
    Route {
        plan: Option<Value>,
        extraction: Value,
        brief: Value,
    },
    /// Always fail with this error
    Fail(ProviderError),
    /// Sleep longer than any sane call timeout
    Hang,
    /// Always return this text
    Reply(String),
}

pub struct MockProvider {
    name: &'static str,
    available: bool,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: true,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unavailable(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: false,
            behavior: Behavior::Reply("{}".to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn call(&self, prompt: &str, _temperature: f32, _timeout: Duration) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Route {
                plan,
                extraction,
                brief,
            } => {
                if prompt.contains("AVAILABLE TASKS") {
                    match plan {
                        Some(plan) => Ok(plan.to_string()),
                        None => Ok("I would rather not plan.".to_string()),
                    }
                } else if prompt.contains("EXTRACTED CASE DATA") {
                    Ok(brief.to_string())
                } else if prompt.contains("DOCUMENT:") {
                    Ok(extraction.to_string())
                } else {
                    Err(ProviderError::InvalidRequest {
                        message: "unexpected prompt".to_string(),
                    })
                }
            }
            Behavior::Fail(error) => Err(error.clone()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok("{}".to_string())
            }
            Behavior::Reply(text) => Ok(text.clone()),
        }
    }
}

pub fn gateway(providers: Vec<Arc<MockProvider>>, call_timeout: Duration) -> ModelGateway {
    let mut gateway = ModelGateway::new(
        call_timeout,
        Arc::new(LivenessCache::new(Duration::from_secs(30))),
    );
    for provider in providers {
        gateway.register(provider);
    }
    gateway
}

pub fn pipeline(settings: RuntimeSettings, providers: Vec<Arc<MockProvider>>) -> Pipeline {
    let gateway = gateway(providers, settings.call_timeout());
    Pipeline::with_components(settings, Arc::new(PromptStore::builtin()), Arc::new(gateway))
        .expect("pipeline assembles")
}

pub fn rule_based_settings() -> RuntimeSettings {
    RuntimeSettings {
        model_assisted_planning: false,
        ..RuntimeSettings::default()
    }
}

pub fn extraction_with_citations(citations: &[&str]) -> Value {
    json!({
        "case_name": "Brown v. Board of Education",
        "court": "Supreme Court of the United States",
        "date": "May 17, 1954",
        "judges": ["Warren"],
        "case_number": "1",
        "facts": "Minors were denied admission to public schools attended by white children.",
        "legal_issues": ["Whether segregation in public schools violates equal protection"],
        "holdings": ["Separate educational facilities are inherently unequal"],
        "reasoning": ["Segregation generates a feeling of inferiority"],
        "citations": citations,
        "disposition": "Reversed",
        "confidence": 0.85
    })
}

pub fn brief_payload() -> Value {
    json!({
        "issue": "Whether school segregation violates equal protection.",
        "facts": "Children were denied admission on the basis of race.",
        "holding": "Separate is inherently unequal.",
        "reasoning": ["Segregation harms children"],
        "key_citations": ["347 U.S. 483"],
        "confidence_score": 90
    })
}

/// Opinion text of exactly `len` characters with no brief keywords in it.
pub fn opinion_text(len: usize) -> String {
    "The appellants challenge the state practice of separate public schools. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}
