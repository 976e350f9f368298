//! Gateway Integration Tests
//!
//! Provider fallback, exhaustion, liveness filtering and hints.

use std::time::Duration;

use lexbrief::services::gateway::{FailureReason, ModelRequest, ProviderHint};
use lexbrief::services::preferences::PreferenceSet;
use lexbrief_core::PipelineError;
use lexbrief_llm::ProviderError;

use super::support::{gateway, Behavior, MockProvider};

#[tokio::test(start_paused = true)]
async fn test_primary_timeout_falls_back() {
    let primary = MockProvider::new("gemini", Behavior::Hang);
    let fallback = MockProvider::new("ollama", Behavior::Reply(r#"{"ok": true}"#.to_string()));
    let gw = gateway(vec![primary.clone(), fallback.clone()], Duration::from_secs(2));

    let response = gw.infer("prompt", &PreferenceSet::default()).await.unwrap();

    assert_eq!(response.provider_used, "ollama");
    assert_eq!(response.raw_text, r#"{"ok": true}"#);
    assert_eq!(response.attempts.len(), 2);
    assert_eq!(response.attempts[0].provider, "gemini");
    assert_eq!(response.attempts[0].failure_reason, Some(FailureReason::Timeout));
    assert!(response.attempts[1].success);
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn test_all_providers_failing_is_no_model_available() {
    let gw = gateway(
        vec![
            MockProvider::new("gemini", Behavior::Fail(ProviderError::RateLimited {
                message: "slow down".to_string(),
            })),
            MockProvider::new("ollama", Behavior::Fail(ProviderError::EmptyResponse)),
        ],
        Duration::from_secs(5),
    );

    let err = gw.infer("prompt", &PreferenceSet::default()).await.unwrap_err();
    match err {
        PipelineError::NoModelAvailable { failures } => {
            let providers: Vec<&str> = failures.iter().map(|f| f.provider.as_str()).collect();
            assert_eq!(providers, vec!["gemini", "ollama"]);
        }
        other => panic!("expected NoModelAvailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_parse_error_does_not_fall_back() {
    let primary = MockProvider::new("gemini", Behavior::Reply("no json here".to_string()));
    let fallback = MockProvider::new("ollama", Behavior::Reply("{}".to_string()));
    let gw = gateway(vec![primary.clone(), fallback.clone()], Duration::from_secs(5));

    let err = gw
        .infer_json(&ModelRequest::new("prompt"), &PreferenceSet::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::ResponseParse(_)));
    assert_eq!(fallback.calls(), 0);
}

#[tokio::test]
async fn test_unavailable_provider_is_never_called() {
    let primary = MockProvider::unavailable("gemini");
    let fallback = MockProvider::new("ollama", Behavior::Reply("{}".to_string()));
    let gw = gateway(vec![primary.clone(), fallback], Duration::from_secs(5));

    let response = gw.infer("prompt", &PreferenceSet::default()).await.unwrap();
    assert_eq!(response.provider_used, "ollama");
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn test_fallback_hint_starts_at_fallback() {
    let primary = MockProvider::new("gemini", Behavior::Reply("{}".to_string()));
    let fallback = MockProvider::new("ollama", Behavior::Reply("{}".to_string()));
    let gw = gateway(vec![primary.clone(), fallback.clone()], Duration::from_secs(5));

    let request = ModelRequest::new("prompt").with_hint(ProviderHint::Fallback);
    let response = gw
        .infer_request(&request, &PreferenceSet::default())
        .await
        .unwrap();

    assert_eq!(response.provider_used, "ollama");
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn test_no_registered_providers() {
    let gw = gateway(vec![], Duration::from_secs(5));
    let err = gw.infer("prompt", &PreferenceSet::default()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoModelAvailable { .. }));
}
