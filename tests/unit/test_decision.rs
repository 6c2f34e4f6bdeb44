//! Unit tests for the decision engine
//!
//! Tests cover:
//! - Correlation boosts and ranking
//! - Default cause for empty input
//! - RCA synthesis (timeline, impact, actions, lessons)
//! - Correlated signals

use chrono::{NaiveDate, NaiveDateTime};
use rootcause::config::Thresholds;
use rootcause::decision::rca::{ActionPriority, HealthStatus, ImpactSeverity};
use rootcause::decision::{DecisionEngine, SignalStrength};
use rootcause::log_analysis::{LogSummary, MetricSnapshot};
use rootcause::reasoning::{Cause, CauseSuggestions};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 14)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap()
}

fn summary(total: usize, errors: usize, critical: usize, windows: usize) -> LogSummary {
    let mut s = LogSummary {
        total_logs: total,
        window_count: windows,
        ..LogSummary::default()
    };
    s.severity_breakdown.error = errors;
    s.severity_breakdown.critical = critical;
    s.severity_breakdown.info = total.saturating_sub(errors + critical);
    s
}

fn suggestions(causes: Vec<Cause>) -> CauseSuggestions {
    CauseSuggestions {
        probable_causes: causes,
        ..CauseSuggestions::default()
    }
}

// ============================================================================
// Ranking Tests
// ============================================================================

mod ranking_tests {
    use super::*;

    #[test]
    fn test_boost_reorders_candidates() {
        let engine = DecisionEngine::default();
        let metrics = MetricSnapshot::new().with_memory(95.0);
        let decision = engine.decide_at(
            &suggestions(vec![
                Cause::new("Slow third-party API", 0.7),
                Cause::new("OOM in image resizer", 0.6),
            ]),
            &metrics,
            &summary(10, 2, 0, 1),
            now(),
        );
        assert_eq!(decision.likely_cause, "OOM in image resizer");
        assert!((decision.confidence - 0.75).abs() < 1e-9);
        assert_eq!(decision.all_causes.len(), 2);
        assert!(decision.all_causes[0].confidence >= decision.all_causes[1].confidence);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let engine = DecisionEngine::default();
        let decision = engine.decide_at(
            &suggestions(vec![
                Cause::new("First", 0.5),
                Cause::new("Second", 0.5),
                Cause::new("Third", 0.5),
            ]),
            &MetricSnapshot::new(),
            &summary(3, 0, 0, 1),
            now(),
        );
        let order: Vec<&str> = decision.all_causes.iter().map(|c| c.cause.as_str()).collect();
        assert_eq!(order, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_confidence_never_exceeds_cap() {
        let engine = DecisionEngine::default();
        let metrics = MetricSnapshot::new()
            .with_db_latency(2000.0)
            .with_cpu(99.0)
            .with_memory(99.0)
            .with_requests_per_sec(5000);
        let decision = engine.decide_at(
            &suggestions(vec![Cause::new(
                "Database connection timeout under CPU and memory pressure",
                0.95,
            )]),
            &metrics,
            &summary(100, 80, 5, 6),
            now(),
        );
        assert_eq!(decision.confidence, 0.99);
    }

    #[test]
    fn test_empty_candidates_default() {
        let decision = DecisionEngine::default().decide_at(
            &CauseSuggestions::default(),
            &MetricSnapshot::new(),
            &LogSummary::default(),
            now(),
        );
        assert_eq!(
            decision.likely_cause,
            "Unknown issue - requires manual investigation"
        );
        assert_eq!(decision.confidence, 0.3);
        assert_eq!(
            decision.reasoning,
            "Insufficient data to determine root cause"
        );
        assert!(decision.all_causes.is_empty());
    }

    #[test]
    fn test_custom_thresholds_change_boosts() {
        let mut thresholds = Thresholds::default();
        thresholds.boost.memory_percent = 50.0;
        let engine = DecisionEngine::new(thresholds);
        let decision = engine.decide_at(
            &suggestions(vec![Cause::new("Memory pressure", 0.5)]),
            &MetricSnapshot::new().with_memory(60.0),
            &summary(1, 1, 0, 1),
            now(),
        );
        assert!((decision.confidence - 0.65).abs() < 1e-9);
    }
}

// ============================================================================
// RCA Tests
// ============================================================================

mod rca_tests {
    use super::*;

    #[test]
    fn test_database_incident_rca() {
        let metrics = MetricSnapshot::new()
            .with_db_latency(450.0)
            .with_requests_per_sec(1200);
        let decision = DecisionEngine::default().decide_at(
            &suggestions(vec![Cause::new("Database connection pool exhausted", 0.7)]),
            &metrics,
            &summary(20, 10, 2, 4),
            now(),
        );
        let rca = &decision.rca;

        assert_eq!(rca.root_cause, "Database connection pool exhausted");
        assert_eq!(rca.timeline.duration_minutes, 20);
        assert_eq!(rca.timeline.time_windows_affected, 4);
        assert_eq!(
            rca.timeline.estimated_start,
            NaiveDate::from_ymd_opt(2024, 2, 14)
                .unwrap()
                .and_hms_opt(10, 40, 0)
                .unwrap()
        );

        assert_eq!(rca.impact.severity, ImpactSeverity::Critical);
        assert_eq!(rca.impact.total_errors, 12);
        assert_eq!(rca.impact.error_rate_percentage, 60.0);
        // 1200 rps * 20 min * 60%
        assert_eq!(rca.impact.estimated_affected_requests, 14400);
        assert_eq!(rca.impact.system_health.db, HealthStatus::Warning);

        assert_eq!(rca.five_whys.len(), 5);
        assert_eq!(rca.five_whys[0].answer, "Database connections timed out");
        assert_eq!(rca.immediate_actions[0].priority, ActionPriority::Urgent);
        assert!(rca
            .contributing_factors
            .contains(&"Possible connection pool exhaustion".to_string()));
        assert!(rca
            .lessons_learned
            .contains(&"Issue persisted for 20 minutes before detection".to_string()));
        assert!(rca
            .prevention_steps
            .contains(&"Document runbooks for common incidents".to_string()));
    }

    #[test]
    fn test_generic_cause_gets_generic_actions() {
        let decision = DecisionEngine::default().decide_at(
            &suggestions(vec![
                Cause::new("Expired TLS certificate", 0.8).with_reasoning("Handshake failures")
            ]),
            &MetricSnapshot::new(),
            &summary(5, 5, 0, 1),
            now(),
        );
        let rca = &decision.rca;
        assert_eq!(rca.impact.severity, ImpactSeverity::Medium);
        assert_eq!(rca.five_whys[0].answer, "Expired TLS certificate");
        assert_eq!(rca.five_whys[1].answer, "Handshake failures");
        assert_eq!(rca.immediate_actions.len(), 3);
        assert!(rca
            .immediate_actions
            .iter()
            .all(|a| a.priority == ActionPriority::Medium));
    }

    #[test]
    fn test_high_error_count_without_critical() {
        let decision = DecisionEngine::default().decide_at(
            &suggestions(vec![Cause::new("Bad deploy", 0.6)]),
            &MetricSnapshot::new(),
            &summary(40, 11, 0, 1),
            now(),
        );
        assert_eq!(decision.rca.impact.severity, ImpactSeverity::High);
        assert!(decision.summary_line().starts_with("High issue detected: Bad deploy"));
    }
}

// ============================================================================
// Correlated Signal Tests
// ============================================================================

mod signal_tests {
    use super::*;

    #[test]
    fn test_signals_independent_of_cause() {
        let metrics = MetricSnapshot::new()
            .with_db_latency(350.0)
            .with_cpu(80.0)
            .with_requests_per_sec(600);
        let engine = DecisionEngine::default();
        let signals = engine.correlated_signals(&metrics, &summary(10, 3, 0, 5));

        let labels: Vec<&str> = signals.iter().map(|s| s.signal.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "High DB latency with error spike",
                "CPU saturation under load",
                "Sustained issue across multiple time windows",
            ]
        );
        assert_eq!(signals[0].strength, SignalStrength::Strong);
        assert_eq!(signals[2].metrics["window_count"], 5);
    }

    #[test]
    fn test_no_signals_on_quiet_system() {
        let signals = DecisionEngine::default()
            .correlated_signals(&MetricSnapshot::new(), &summary(10, 0, 0, 1));
        assert!(signals.is_empty());
    }
}
