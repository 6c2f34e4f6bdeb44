//! Unit tests for configuration wiring
//!
//! Tests cover:
//! - Loading TOML from disk
//! - Thresholds flowing into the pipeline
//! - Redacted rendering

use chrono::NaiveDate;
use rootcause::config::{Config, Provider};
use rootcause::log_analysis::{MetricSnapshot, RawLogInput};
use rootcause::pipeline::Pipeline;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_load_explicit_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(
        &path,
        r#"
[reasoning]
provider = "anthropic"
model = "claude-test"

[thresholds.boost]
error_count = 2
"#,
    )
    .unwrap();

    let config = Config::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.reasoning.provider, Provider::Anthropic);
    assert_eq!(config.reasoning.model, "claude-test");
    assert_eq!(config.thresholds.boost.error_count, 2);
    assert_eq!(config.thresholds.boost.db_latency_ms, 300.0);
}

#[test]
fn test_invalid_toml_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[reasoning\nmodel = ").unwrap();
    assert!(Config::from_file(path.to_str().unwrap()).is_err());
}

#[test]
fn test_window_minutes_reach_preprocessor() {
    let mut config = Config::default();
    config.preprocess.window_minutes = 60;
    let now = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let inputs = vec![
        RawLogInput::new("a").with_timestamp("2024-01-01 10:05:00"),
        RawLogInput::new("b").with_timestamp("2024-01-01 10:55:00"),
    ];

    let report = Pipeline::offline(&config).analyze_offline_at(&inputs, &MetricSnapshot::new(), now);
    assert_eq!(report.summary.window_count, 1);

    let report =
        Pipeline::offline(&Config::default()).analyze_offline_at(&inputs, &MetricSnapshot::new(), now);
    assert_eq!(report.summary.window_count, 2);
}

#[test]
fn test_fallback_thresholds_reach_proposer() {
    let mut config = Config::default();
    config.thresholds.fallback.cpu_percent = 50.0;
    let inputs = vec![RawLogInput::new("slow").with_timestamp("2024-01-01 10:00:00")];
    let metrics = MetricSnapshot::new().with_cpu(60.0);

    let report = Pipeline::offline(&config).analyze_offline(&inputs, &metrics);
    assert_eq!(report.decision.likely_cause, "CPU resource exhaustion");
    assert_eq!(report.decision.reasoning, "CPU usage exceeds 50%");

    let report = Pipeline::offline(&Config::default()).analyze_offline(&inputs, &metrics);
    assert_ne!(report.decision.likely_cause, "CPU resource exhaustion");
}

#[test]
fn test_redacted_toml_hides_key() {
    let mut config = Config::default();
    config.reasoning.api_key = Some("sk-live-abcdefghijklmnop".to_string());
    let rendered = config.to_redacted_toml().unwrap();
    assert!(!rendered.contains("abcdefghijklmnop"));
    assert!(rendered.contains("sk-l****"));

    let back: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(back.thresholds, config.thresholds);
}
