//! Unit tests for cause proposal
//!
//! Tests cover:
//! - Fallback rules
//! - Response parsing
//! - Proposer fallback on service failure

use async_trait::async_trait;
use rootcause::api::LlmClient;
use rootcause::config::thresholds::FallbackThresholds;
use rootcause::errors::ApiError;
use rootcause::log_analysis::{LogSummary, MetricSnapshot};
use rootcause::reasoning::prompt::{build_prompt, parse_response};
use rootcause::reasoning::{fallback, CauseProposer, SuggestionSource};
use std::sync::Arc;
use std::time::Duration;

fn errors(n: usize) -> LogSummary {
    let mut s = LogSummary {
        total_logs: n,
        ..LogSummary::default()
    };
    s.severity_breakdown.error = n;
    s
}

struct FixedClient(Result<&'static str, u16>);

#[async_trait]
impl LlmClient for FixedClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, ApiError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(status) => Err(ApiError::HttpStatus {
                status,
                message: "nope".to_string(),
            }),
        }
    }
}

fn proposer(client: FixedClient) -> CauseProposer {
    CauseProposer::with_client(
        Arc::new(client),
        FallbackThresholds::default(),
        Duration::from_secs(5),
    )
}

#[test]
fn test_fallback_both_rules() {
    let metrics = MetricSnapshot::new().with_db_latency(400.0).with_cpu(85.0);
    let out = fallback::analyze(&errors(3), &metrics, &FallbackThresholds::default());
    let names: Vec<&str> = out.probable_causes.iter().map(|c| c.cause.as_str()).collect();
    assert_eq!(
        names,
        vec!["Database performance degradation", "CPU resource exhaustion"]
    );
    assert_eq!(out.probable_causes[0].evidence[0], "DB latency: 400ms");
    assert_eq!(out.source, SuggestionSource::Fallback);
}

#[test]
fn test_fallback_requires_errors_for_database_rule() {
    let metrics = MetricSnapshot::new().with_db_latency(900.0);
    let out = fallback::analyze(&errors(0), &metrics, &FallbackThresholds::default());
    assert!(out.probable_causes.is_empty());
    assert_eq!(out.next_steps.len(), 3);
}

#[test]
fn test_prompt_lists_messages() {
    let summary = LogSummary {
        unique_messages: vec!["Deadlock detected".to_string()],
        ..errors(1)
    };
    let prompt = build_prompt(&summary, &MetricSnapshot::new());
    assert!(prompt.contains("1. Deadlock detected"));
}

#[test]
fn test_parse_response_wrapped_in_prose() {
    let out = parse_response(
        "Here is my analysis:\n{\"probable_causes\": [{\"cause\": \"Deadlock\", \"confidence\": 0.4}]}\nThanks",
    )
    .unwrap();
    assert_eq!(out.probable_causes[0].cause, "Deadlock");
    assert_eq!(out.source, SuggestionSource::External);
}

#[tokio::test]
async fn test_proposer_uses_service_reply() {
    let p = proposer(FixedClient(Ok(
        r#"{"probable_causes": [{"cause": "Cache stampede", "confidence": 0.55}]}"#,
    )));
    let out = p.propose(&errors(2), &MetricSnapshot::new()).await;
    assert_eq!(out.source, SuggestionSource::External);
    assert_eq!(out.probable_causes[0].cause, "Cache stampede");
}

#[tokio::test]
async fn test_proposer_falls_back_on_http_error() {
    let p = proposer(FixedClient(Err(503)));
    let metrics = MetricSnapshot::new().with_cpu(95.0);
    let out = p.propose(&errors(2), &metrics).await;
    assert_eq!(out.source, SuggestionSource::Fallback);
    assert_eq!(out.probable_causes[0].cause, "CPU resource exhaustion");
}

#[tokio::test]
async fn test_proposer_falls_back_on_garbage() {
    let p = proposer(FixedClient(Ok("I am not sure what happened.")));
    let out = p.propose(&errors(2), &MetricSnapshot::new()).await;
    assert_eq!(out.source, SuggestionSource::Fallback);
}
