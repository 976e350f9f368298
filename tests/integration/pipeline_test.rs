//! Pipeline Integration Tests
//!
//! End-to-end runs through planning and execution with mock providers:
//! - extraction followed by citation normalization
//! - extraction failure propagating to dependents
//! - unrecognized citations kept as a partial success
//! - model-assisted planning and its rule-based fallback

use lexbrief::services::planner::PlanStrategy;
use lexbrief::PipelineRequest;
use lexbrief_core::{ErrorKind, TaskId, TaskStatus, UPSTREAM_FAILED};
use lexbrief_llm::ProviderError;
use serde_json::json;

use super::support::{
    brief_payload, extraction_with_citations, opinion_text, pipeline, rule_based_settings,
    Behavior, MockProvider,
};

const CITATIONS: [&str; 3] = [
    "Brown v. Board of Education, 347 U.S. 483 (1954)",
    "42 U.S.C. § 1983",
    "U.S. Const. amend. XIV",
];

// ============================================================================
// Extraction then normalization
// ============================================================================

#[tokio::test]
async fn test_extract_then_normalize_three_citations() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction: extraction_with_citations(&CITATIONS),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(rule_based_settings(), vec![provider.clone()]);

    let request = PipelineRequest::document(opinion_text(500));
    assert_eq!(request.document.chars().count(), 500);
    let overrides = json!({
        "general": {"auto_generate_brief": false},
        "citation": {"normalize_citations": true}
    });

    let outcome = pipeline.run_pipeline(&request, &overrides, None).await.unwrap();

    assert_eq!(
        outcome.plan.task_ids(),
        vec![TaskId::Extract, TaskId::NormalizeCitations]
    );
    assert_eq!(outcome.plan.strategy, PlanStrategy::RuleBased);

    let extract = outcome.results.get(TaskId::Extract).unwrap();
    assert_eq!(extract.status, TaskStatus::Success);
    assert_eq!(extract.provider_used.as_deref(), Some("gemini"));

    let normalized = outcome.results.get(TaskId::NormalizeCitations).unwrap();
    assert_eq!(normalized.status, TaskStatus::Success);
    assert!(normalized.validation_errors.is_empty());
    let strings = normalized.payload["citations"].as_array().unwrap();
    assert_eq!(strings.len(), 3);
    assert_eq!(strings[0], "Brown v. Board of Education, 347 U.S. 483 (1954)");
    assert_eq!(strings[1], "42 U.S.C. § 1983");
    assert_eq!(strings[2], "U.S. Const. amend. XIV");
    assert_eq!(normalized.payload["total_processed"], 3);

    // Only extraction needs the model
    assert_eq!(provider.calls(), 1);
    assert!(outcome.results.get(TaskId::Brief).is_none());
}

#[tokio::test]
async fn test_citation_format_override_applies() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction: extraction_with_citations(&CITATIONS),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(rule_based_settings(), vec![provider]);

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(300)), &json!({"citation": {"format": "mla"}}), None)
        .await
        .unwrap();

    let normalized = outcome.results.get(TaskId::NormalizeCitations).unwrap();
    assert_eq!(normalized.payload["format"], "mla");
    assert_eq!(normalized.payload["citations"][1], "U.S.C., title 42, sec. 1983");
}

#[tokio::test]
async fn test_brief_words_inside_document_do_not_schedule_brief() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction: extraction_with_citations(&CITATIONS),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(rule_based_settings(), vec![provider.clone()]);
    let document = "The district court granted summary judgment for the defendant. \
                    The appellant's brief argues the record was incomplete. We reverse.";

    let outcome = pipeline
        .run_pipeline(
            &PipelineRequest::document(document),
            &json!({"general": {"auto_generate_brief": false}}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.plan.task_ids(),
        vec![TaskId::Extract, TaskId::NormalizeCitations]
    );
    assert!(outcome.results.get(TaskId::Brief).is_none());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_brief_requested_by_instruction_only() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction: extraction_with_citations(&CITATIONS),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(rule_based_settings(), vec![provider]);

    let outcome = pipeline
        .run_pipeline(
            &PipelineRequest::new("Summarize this opinion", opinion_text(300)),
            &json!({}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.plan.task_ids(),
        vec![TaskId::Extract, TaskId::Brief, TaskId::NormalizeCitations]
    );
    assert!(outcome.results.succeeded(TaskId::Brief));
}

// ============================================================================
// Failure propagation
// ============================================================================

#[tokio::test]
async fn test_extraction_failure_skips_dependents() {
    let pipeline = pipeline(
        rule_based_settings(),
        vec![
            MockProvider::unavailable("gemini"),
            MockProvider::unavailable("ollama"),
        ],
    );

    let outcome = pipeline
        .run_pipeline(
            &PipelineRequest::new("Please summarize this opinion.", opinion_text(200)),
            &json!({}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.plan.task_ids(),
        vec![TaskId::Extract, TaskId::Brief, TaskId::NormalizeCitations]
    );

    let extract = outcome.results.get(TaskId::Extract).unwrap();
    assert_eq!(extract.status, TaskStatus::Failed);
    assert_eq!(extract.error_kind, Some(ErrorKind::NoModelAvailable));

    for dependent in [TaskId::Brief, TaskId::NormalizeCitations] {
        let result = outcome.results.get(dependent).unwrap();
        assert_eq!(result.status, TaskStatus::Skipped, "{}", dependent);
        assert_eq!(result.reason.as_deref(), Some(UPSTREAM_FAILED));
    }
}

#[tokio::test]
async fn test_brief_failure_does_not_block_normalization() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction: extraction_with_citations(&CITATIONS),
            // Unparseable twice over
            brief: json!("not an object"),
        },
    );
    let mut settings = rule_based_settings();
    settings.call_timeout_secs = 5;
    let pipeline = pipeline(settings, vec![provider]);

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(200)), &json!({"general": {"auto_generate_brief": true}}), None)
        .await
        .unwrap();

    let brief = outcome.results.get(TaskId::Brief).unwrap();
    assert_eq!(brief.status, TaskStatus::Failed);
    assert_eq!(brief.error_kind, Some(ErrorKind::ResponseParseError));
    assert!(outcome.results.succeeded(TaskId::NormalizeCitations));
}

// ============================================================================
// Partial success
// ============================================================================

#[tokio::test]
async fn test_unrecognized_citation_is_partial_success() {
    let odd = "See generally the Restatement of Contracts";
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction: extraction_with_citations(&[CITATIONS[0], odd]),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(rule_based_settings(), vec![provider]);

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(400)), &json!({}), None)
        .await
        .unwrap();

    let normalized = outcome.results.get(TaskId::NormalizeCitations).unwrap();
    assert_eq!(normalized.status, TaskStatus::Success);
    assert_eq!(normalized.payload["citations"][1], odd);
    assert_eq!(normalized.payload["normalized_citations"][1]["kind"], "unknown");
    assert_eq!(normalized.validation_errors.len(), 1);
    assert!(normalized.validation_errors[0].contains(odd));
}

#[tokio::test]
async fn test_no_citations_skips_normalization_at_run_time() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction: extraction_with_citations(&[]),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(rule_based_settings(), vec![provider]);

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(100)), &json!({}), None)
        .await
        .unwrap();

    let planned = outcome
        .plan
        .tasks
        .iter()
        .find(|t| t.id == TaskId::NormalizeCitations)
        .unwrap();
    assert!(planned.provisional);

    let normalized = outcome.results.get(TaskId::NormalizeCitations).unwrap();
    assert_eq!(normalized.status, TaskStatus::Skipped);
    assert_eq!(normalized.reason.as_deref(), Some("no citations extracted"));
}

#[tokio::test]
async fn test_placeholder_citations_skip_normalization() {
    let mut extraction = extraction_with_citations(&[]);
    extraction["citations"] = json!("Not found");
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: None,
            extraction,
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(rule_based_settings(), vec![provider]);

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(150)), &json!({}), None)
        .await
        .unwrap();

    let extract = outcome.results.get(TaskId::Extract).unwrap();
    assert_eq!(extract.status, TaskStatus::Success);
    assert_eq!(extract.payload["citations"], json!(["Not found"]));

    let normalized = outcome.results.get(TaskId::NormalizeCitations).unwrap();
    assert_eq!(normalized.status, TaskStatus::Skipped);
    assert_eq!(normalized.reason.as_deref(), Some("no citations extracted"));
}

// ============================================================================
// Planning strategies
// ============================================================================

#[tokio::test]
async fn test_model_assisted_plan_with_legacy_names() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: Some(json!({
                "analysis": "The user wants a brief.",
                "execution_sequence": ["legal_extractor", "brief_generator"],
                "confidence": 0.9
            })),
            extraction: extraction_with_citations(&CITATIONS),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(lexbrief::RuntimeSettings::default(), vec![provider.clone()]);

    let outcome = pipeline
        .run_pipeline(
            &PipelineRequest::new("Write a brief of this opinion.", opinion_text(300)),
            &json!({}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.plan.strategy, PlanStrategy::ModelAssisted);
    assert_eq!(outcome.plan.task_ids(), vec![TaskId::Extract, TaskId::Brief]);
    assert!((outcome.plan.confidence - 0.9).abs() < 1e-9);

    let brief = outcome.results.get(TaskId::Brief).unwrap();
    assert_eq!(brief.status, TaskStatus::Success);
    assert_eq!(brief.payload["confidence_score"], json!(0.9));
    assert!(brief.payload["word_count"].as_u64().unwrap() > 0);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_invalid_model_plan_falls_back_to_rules() {
    let provider = MockProvider::new(
        "gemini",
        Behavior::Route {
            plan: Some(json!({
                "execution_sequence": ["brief", "extract"],
                "confidence": 0.95
            })),
            extraction: extraction_with_citations(&CITATIONS),
            brief: brief_payload(),
        },
    );
    let pipeline = pipeline(lexbrief::RuntimeSettings::default(), vec![provider]);

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(250)), &json!({}), None)
        .await
        .unwrap();

    assert_eq!(outcome.plan.strategy, PlanStrategy::RuleBased);
    assert!((outcome.plan.confidence - 0.7).abs() < 1e-9);
    assert!(outcome.plan.rationale.contains("model-assisted planning failed"));
    assert_eq!(
        outcome.plan.task_ids(),
        vec![TaskId::Extract, TaskId::NormalizeCitations]
    );
}

#[tokio::test]
async fn test_planning_provider_failure_falls_back_to_rules() {
    let pipeline = pipeline(
        lexbrief::RuntimeSettings::default(),
        vec![MockProvider::new(
            "gemini",
            Behavior::Fail(ProviderError::ServerError {
                message: "boom".to_string(),
                status: Some(500),
            }),
        )],
    );

    let outcome = pipeline
        .run_pipeline(&PipelineRequest::document(opinion_text(50)), &json!({}), None)
        .await
        .unwrap();
    assert_eq!(outcome.plan.strategy, PlanStrategy::RuleBased);
    assert_eq!(
        outcome.results.get(TaskId::Extract).unwrap().status,
        TaskStatus::Failed
    );
}
