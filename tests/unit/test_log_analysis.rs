//! Unit tests for normalization and preprocessing
//!
//! Tests cover:
//! - Line format cascade
//! - Severity inference priority
//! - Duplicate marking and window grouping
//! - Diagnostic parse reports

use chrono::{NaiveDate, NaiveDateTime};
use rootcause::log_analysis::{
    diagnose, infer_severity, normalize_at, normalize_lines, parse_line_at, preprocess_at,
    LineFormat, Preprocessor, RawLogInput, Severity,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 14)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 14)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

// ============================================================================
// Normalizer Tests
// ============================================================================

mod normalizer_tests {
    use super::*;

    #[test]
    fn test_framework_style_line() {
        let record = normalize_at(
            "[2024-02-14 10:30:45] production.ERROR: SQLSTATE[HY000] Connection refused",
            now(),
        );
        assert_eq!(record.timestamp, ts(10, 30, 45));
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.message, "SQLSTATE[HY000] Connection refused");
        assert!(!record.is_duplicate);
    }

    #[test]
    fn test_plain_timestamp_with_level() {
        let parsed = parse_line_at("2024-02-14 10:31:00 WARNING: Queue depth 900", now());
        assert_eq!(parsed.format, LineFormat::TimestampLevel);
        assert_eq!(parsed.record.severity, Severity::Warning);
        assert_eq!(parsed.record.message, "Queue depth 900");
    }

    #[test]
    fn test_unstructured_line_uses_now() {
        let record = normalize_at("kernel: Out of memory: Killed process 4242", now());
        assert_eq!(record.timestamp, now());
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.raw, "kernel: Out of memory: Killed process 4242");
    }

    #[test]
    fn test_raw_is_preserved() {
        let line = "[2024-02-14 10:30:45] local.INFO: Cache warmed";
        assert_eq!(normalize_at(line, now()).raw, line);
    }

    #[test]
    fn test_severity_priority() {
        assert_eq!(infer_severity("FATAL error during boot"), Severity::Critical);
        assert_eq!(infer_severity("exception thrown; warning ignored"), Severity::Error);
        assert_eq!(infer_severity("disk WARN"), Severity::Warning);
        assert_eq!(infer_severity("all good"), Severity::Info);
    }

    #[test]
    fn test_normalize_lines_skips_blank() {
        let records = normalize_lines(["", "ERROR: one", "   ", "two"], now());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity, Severity::Error);
    }

    #[test]
    fn test_diagnose_counts_formats() {
        let lines = [
            "[2024-02-14 10:30:45] production.ERROR: a",
            "[2024-02-14 10:30:46] b",
            "2024-02-14 10:30:47 c",
            "d",
        ];
        let report = diagnose(lines, 10);
        assert_eq!(report.lines_checked, 4);
        assert_eq!(report.structured, 3);
        assert_eq!(report.generic, 1);
        assert_eq!(report.by_format.get(&LineFormat::Generic), Some(&1));
        assert_eq!(report.structured_rate(), 75.0);
    }

    #[test]
    fn test_diagnose_respects_limit() {
        let lines = vec!["x"; 30];
        let report = diagnose(lines.iter().copied(), 5);
        assert_eq!(report.lines_checked, 5);
        assert_eq!(report.samples.len(), 5);
    }
}

// ============================================================================
// Preprocessor Tests
// ============================================================================

mod preprocess_tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let inputs = vec![
            RawLogInput::new("ERROR: a").with_timestamp("2024-02-14 10:00:00"),
            RawLogInput::new("ERROR: a").with_timestamp("2024-02-14 10:05:00"),
            RawLogInput::new("CRITICAL: b").with_timestamp("2024-02-14 10:12:00"),
            RawLogInput::new("warning: c").with_timestamp("2024-02-14 10:25:00"),
        ];
        let (summary, records) = preprocess_at(&inputs, now());

        assert_eq!(summary.total_logs, 4);
        assert_eq!(summary.severity_breakdown.error, 2);
        assert_eq!(summary.severity_breakdown.critical, 1);
        assert_eq!(summary.severity_breakdown.warning, 1);
        assert_eq!(summary.severity_breakdown.total(), summary.total_logs);
        assert_eq!(summary.unique_messages, vec!["ERROR: a", "CRITICAL: b", "warning: c"]);
        assert_eq!(summary.window_count, 3);
        assert_eq!(records.iter().filter(|r| r.is_duplicate).count(), 1);
    }

    #[test]
    fn test_duplicates_are_global_first_wins() {
        let inputs = vec![
            RawLogInput::new("same").with_timestamp("2024-02-14 09:00:00"),
            RawLogInput::new("same").with_timestamp("2024-02-14 11:00:00"),
        ];
        let (_, records) = preprocess_at(&inputs, now());
        let first = records.iter().find(|r| r.timestamp == ts(9, 0, 0)).unwrap();
        let second = records.iter().find(|r| r.timestamp == ts(11, 0, 0)).unwrap();
        assert!(!first.is_duplicate);
        assert!(second.is_duplicate);
    }

    #[test]
    fn test_window_boundaries() {
        let inputs = vec![
            RawLogInput::new("a").with_timestamp("2024-02-14 10:09:59"),
            RawLogInput::new("b").with_timestamp("2024-02-14 10:10:00"),
        ];
        let (summary, _) = preprocess_at(&inputs, now());
        assert_eq!(summary.window_count, 2);
        assert_eq!(summary.time_windows[0].start(), ts(10, 0, 0));
        assert_eq!(summary.time_windows[1].start(), ts(10, 10, 0));
    }

    #[test]
    fn test_custom_window_width() {
        let inputs = vec![
            RawLogInput::new("a").with_timestamp("2024-02-14 10:01:00"),
            RawLogInput::new("b").with_timestamp("2024-02-14 10:29:00"),
        ];
        let (summary, _) = Preprocessor::new(30).process_at(&inputs, now());
        assert_eq!(summary.window_count, 1);
    }

    #[test]
    fn test_bad_timestamp_uses_now() {
        let inputs = vec![RawLogInput::new("x").with_timestamp("yesterday-ish")];
        let (_, records) = preprocess_at(&inputs, now());
        assert_eq!(records[0].timestamp, now());
    }

    #[test]
    fn test_empty_batch() {
        let (summary, records) = preprocess_at(&[], now());
        assert_eq!(summary.total_logs, 0);
        assert_eq!(summary.window_count, 0);
        assert!(records.is_empty());
    }
}
