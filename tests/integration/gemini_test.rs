//! Gemini Provider Integration Tests
//!
//! Runs the HTTP provider against a wiremock server, alone and as the
//! primary provider of a full pipeline run.

use std::sync::Arc;
use std::time::Duration;

use lexbrief::services::gateway::{LivenessCache, ModelGateway};
use lexbrief::services::prompt::PromptStore;
use lexbrief::{Pipeline, PipelineRequest};
use lexbrief_core::{TaskId, TaskStatus};
use lexbrief_llm::{GeminiProvider, ModelProvider, ProviderConfig, ProviderError, ProviderKind};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use super::support::{extraction_with_citations, opinion_text, rule_based_settings, Behavior, MockProvider};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(server.uri()),
        ..ProviderConfig::for_kind(ProviderKind::Gemini)
    }
}

fn text_response(text: &str) -> Value {
    json!({
        "candidates": [
            { "content": { "role": "model", "parts": [ { "text": text } ] } }
        ]
    })
}

/// Answers extraction prompts with a fixed payload.
struct ExtractionResponder;

impl Respond for ExtractionResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let prompt = body
            .pointer("/contents/0/parts/0/text")
            .and_then(|t| t.as_str())
            .unwrap_or("");
        if prompt.contains("DOCUMENT:") {
            let extraction = extraction_with_citations(&["Roe v. Wade, 410 U.S. 113 (1973)"]);
            let fenced = format!("```json\n{}\n```", extraction);
            ResponseTemplate::new(200).set_body_json(text_response(&fenced))
        } else {
            ResponseTemplate::new(400).set_body_string("unexpected prompt")
        }
    }
}

#[tokio::test]
async fn test_generate_content_request_and_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{\"ok\": true}")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config(&server)).unwrap();
    assert!(provider.is_available().await);

    let text = provider
        .call("hello", 0.2, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(text, "{\"ok\": true}");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
}

#[tokio::test]
async fn test_http_errors_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config(&server)).unwrap();
    let err = provider
        .call("hello", 0.2, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited { .. }));
}

#[tokio::test]
async fn test_empty_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config(&server)).unwrap();
    let err = provider
        .call("hello", 0.2, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::EmptyResponse);
}

#[tokio::test]
async fn test_missing_api_key_is_unavailable() {
    let server = MockServer::start().await;
    let provider = GeminiProvider::new(ProviderConfig {
        api_key: None,
        ..config(&server)
    })
    .unwrap();
    assert!(!provider.is_available().await);
}

#[tokio::test]
async fn test_pipeline_over_gemini_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ExtractionResponder)
        .mount(&server)
        .await;

    let gateway = ModelGateway::new(
        Duration::from_secs(5),
        Arc::new(LivenessCache::new(Duration::from_secs(30))),
    )
    .with_provider(Arc::new(GeminiProvider::new(config(&server)).unwrap()));
    let pipeline = Pipeline::with_components(
        rule_based_settings(),
        Arc::new(PromptStore::builtin()),
        Arc::new(gateway),
    )
    .unwrap();

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(300)), &json!({}), None)
        .await
        .unwrap();

    let extract = outcome.results.get(TaskId::Extract).unwrap();
    assert_eq!(extract.status, TaskStatus::Success);
    assert_eq!(extract.provider_used.as_deref(), Some("gemini"));
    assert_eq!(extract.payload["case_name"], "Brown v. Board of Education");

    let normalized = outcome.results.get(TaskId::NormalizeCitations).unwrap();
    assert_eq!(normalized.payload["citations"][0], "Roe v. Wade, 410 U.S. 113 (1973)");
}

#[tokio::test]
async fn test_server_error_falls_back_to_second_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let fallback = MockProvider::new("ollama", Behavior::Reply("{\"ok\": 1}".to_string()));
    let gateway = ModelGateway::new(
        Duration::from_secs(5),
        Arc::new(LivenessCache::new(Duration::from_secs(30))),
    )
    .with_provider(Arc::new(GeminiProvider::new(config(&server)).unwrap()))
    .with_provider(fallback.clone());

    let response = gateway
        .infer("prompt", &lexbrief::services::preferences::PreferenceSet::default())
        .await
        .unwrap();
    assert_eq!(response.provider_used, "ollama");
    assert_eq!(response.attempts.len(), 2);
    assert!(!response.attempts[0].success);
    assert_eq!(fallback.calls(), 1);
}
