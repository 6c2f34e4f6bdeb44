//! Prompt construction and response decoding for the external reasoning service.

use serde::Deserialize;
use std::fmt::Write;

use super::{Cause, CauseSuggestions, SuggestionSource};
use crate::errors::ApiError;
use crate::log_analysis::{LogSummary, MetricSnapshot, Severity};

pub const SYSTEM_PROMPT: &str =
    "You are a production incident analyzer. Always respond in valid JSON format.";

const RESPONSE_FORMAT: &str = r#"{
    "probable_causes": [
        {
            "cause": "string",
            "confidence": 0.0-1.0,
            "reasoning": "string",
            "evidence": ["string"]
        }
    ],
    "next_steps": ["string"],
    "correlations": ["string"]
}"#;

/// Build the user prompt. Output depends only on `summary` and `metrics`.
pub fn build_prompt(summary: &LogSummary, metrics: &MetricSnapshot) -> String {
    let breakdown = &summary.severity_breakdown;
    let mut out = String::with_capacity(1024 + summary.unique_messages.len() * 64);

    out.push_str(
        "You are a production incident analyzer. Analyze the following system data and suggest probable root causes.\n\n",
    );

    out.push_str("**Log Summary:**\n");
    let _ = writeln!(out, "- Total logs: {}", summary.total_logs);
    let _ = writeln!(out, "- Critical: {}", breakdown.get(Severity::Critical));
    let _ = writeln!(out, "- Errors: {}", breakdown.get(Severity::Error));
    let _ = writeln!(out, "- Warnings: {}", breakdown.get(Severity::Warning));
    let _ = writeln!(out, "- Time windows affected: {}", summary.window_count);

    out.push_str("\n**Unique Error Messages:**\n");
    for (i, msg) in summary.unique_messages.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, msg);
    }

    out.push_str("\n**System Metrics:**\n");
    let _ = writeln!(out, "- CPU Usage: {}%", metrics.cpu());
    let _ = writeln!(out, "- Memory Usage: {}%", metrics.memory());
    let _ = writeln!(out, "- DB Latency: {}ms", metrics.db_latency());
    let _ = writeln!(out, "- Requests/sec: {}", metrics.requests_per_sec());

    out.push_str("\n**Task:**\n");
    out.push_str("1. Identify the most probable root cause\n");
    out.push_str("2. Provide confidence score (0-1)\n");
    out.push_str("3. Explain your reasoning\n");
    out.push_str("4. Suggest next steps for investigation\n");

    out.push_str("\n**Response Format (JSON):**\n");
    out.push_str(RESPONSE_FORMAT);
    out.push('\n');
    out
}

/// Span from the first `{` to the last `}`, if any.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Deserialize)]
struct WireSuggestions {
    probable_causes: Vec<Cause>,
    #[serde(default)]
    next_steps: Vec<String>,
    #[serde(default)]
    correlations: Vec<String>,
}

/// Decode a service reply into suggestions. Any deviation from the
/// expected shape is a `Parse` error.
pub fn parse_response(text: &str) -> Result<CauseSuggestions, ApiError> {
    let json = extract_json(text)
        .ok_or_else(|| ApiError::Parse("no JSON object in response".to_string()))?;
    let wire: WireSuggestions =
        serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))?;

    Ok(CauseSuggestions {
        probable_causes: wire
            .probable_causes
            .into_iter()
            .map(Cause::sanitized)
            .collect(),
        next_steps: wire.next_steps,
        correlations: wire.correlations,
        source: SuggestionSource::External,
    })
}
