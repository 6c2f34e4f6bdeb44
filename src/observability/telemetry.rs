//! Telemetry & Observability
//!
//! Structured logging for pipeline runs.
//! Features:
//! - Stage spans with timing and outcome
//! - Configurable log levels via RUST_LOG
//! - Optional JSON output via ROOTCAUSE_LOG_FORMAT=json
//! - Log-injection and secret scrubbing for untrusted text

use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sanitize a string for safe log output by escaping control characters.
/// Log lines under analysis are attacker-controlled; embedded newlines
/// must not forge entries in our own log.
pub fn sanitize_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            '\x1b' => out.push_str("\\e"),
            '\x00' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            r"(?i)(sk-|key-|token-)[A-Za-z0-9_\-]{8,}",
            r"(?i)Bearer\s+[A-Za-z0-9_\-\.]{8,}",
            r"(?i)(password|passwd|pwd)\s*=\s*\S+",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Replace API keys, bearer tokens and connection-string passwords with
/// `[REDACTED]`.
pub fn redact_secrets(input: &str) -> String {
    let mut result = input.to_string();
    for pattern in secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }
    result
}

/// Sanitize then redact; the form every untrusted string takes before
/// reaching a log macro.
pub fn scrub(input: &str) -> String {
    redact_secrets(&sanitize_for_log(input))
}

/// Initialize global tracing subscriber.
/// Only enabled when RUST_LOG is explicitly set so report output stays clean.
pub fn init_tracing() {
    if let Ok(filter) = std::env::var("RUST_LOG") {
        init_tracing_with_filter(&filter);
    }
}

/// Initialize tracing for `--verbose`
pub fn init_tracing_verbose() {
    init_tracing_with_filter("info")
}

fn json_requested() -> bool {
    std::env::var("ROOTCAUSE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Initialize with custom filter string
pub fn init_tracing_with_filter(filter: &str) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));

        // Logs go to stderr; stdout carries the report
        let _ = if json_requested() {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .with_level(true)
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .try_init()
        };
    });
}

fn stage_span(stage: &str) -> Span {
    info_span!(
        "pipeline.stage",
        stage = stage,
        duration_ms = tracing::field::Empty,
        success = tracing::field::Empty,
    )
}

/// Run one fallible pipeline stage inside a span, logging duration and outcome.
pub async fn track_stage<F, Fut, T, E>(stage: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let span = stage_span(stage);
    let start = Instant::now();
    let outcome = f().instrument(span.clone()).await;
    let duration = start.elapsed().as_millis() as u64;
    span.record("duration_ms", duration);
    span.record("success", outcome.is_ok());

    span.in_scope(|| match &outcome {
        Ok(_) => info!(duration_ms = duration, "Stage completed"),
        Err(e) => {
            let safe_err = scrub(&e.to_string());
            error!(
                duration_ms = duration,
                error = safe_err.as_str(),
                "Stage failed"
            );
        }
    });
    outcome
}

/// Run an infallible stage inside a span, logging its duration.
pub async fn time_stage<F, Fut, T>(stage: &str, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let span = stage_span(stage);
    let start = Instant::now();
    let output = f().instrument(span.clone()).await;
    let duration = start.elapsed().as_millis() as u64;
    span.record("duration_ms", duration);
    span.record("success", true);
    span.in_scope(|| info!(duration_ms = duration, "Stage completed"));
    output
}

/// Initialize tracing for tests with a simple subscriber
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
