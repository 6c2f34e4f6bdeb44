//! Correlation boost rules.
//!
//! Each group is keyed by keywords in the cause text; when the cause
//! mentions any of them, every condition of the group that holds adds its
//! amount. Groups are cumulative.

use super::mentions_any;
use crate::config::thresholds::BoostThresholds;
use crate::log_analysis::{LogSummary, MetricSnapshot, Severity};
use crate::reasoning::{clamp_confidence, Cause};

pub struct BoostInput<'a> {
    pub metrics: &'a MetricSnapshot,
    pub summary: &'a LogSummary,
    pub thresholds: &'a BoostThresholds,
}

pub struct BoostCondition {
    pub amount: f64,
    pub holds: fn(&BoostInput<'_>) -> bool,
}

pub struct BoostGroup {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub conditions: &'static [BoostCondition],
}

pub static BOOST_GROUPS: &[BoostGroup] = &[
    BoostGroup {
        name: "database",
        keywords: &["database", "db"],
        conditions: &[
            BoostCondition {
                amount: 0.10,
                holds: |i| i.metrics.db_latency() > i.thresholds.db_latency_ms,
            },
            BoostCondition {
                amount: 0.05,
                holds: |i| i.metrics.db_latency() > i.thresholds.db_latency_severe_ms,
            },
            BoostCondition {
                amount: 0.05,
                holds: |i| i.summary.severity_breakdown.get(Severity::Error) > i.thresholds.error_count,
            },
        ],
    },
    BoostGroup {
        name: "cpu",
        keywords: &["cpu", "resource"],
        conditions: &[
            BoostCondition {
                amount: 0.10,
                holds: |i| i.metrics.cpu() > i.thresholds.cpu_percent,
            },
            BoostCondition {
                amount: 0.05,
                holds: |i| i.metrics.requests_per_sec() > i.thresholds.requests_per_sec,
            },
        ],
    },
    BoostGroup {
        name: "memory",
        keywords: &["memory", "oom"],
        conditions: &[BoostCondition {
            amount: 0.15,
            holds: |i| i.metrics.memory() > i.thresholds.memory_percent,
        }],
    },
    BoostGroup {
        name: "timeout",
        keywords: &["timeout", "connection"],
        conditions: &[BoostCondition {
            amount: 0.10,
            holds: |i| i.metrics.db_latency() > i.thresholds.timeout_latency_ms,
        }],
    },
];

/// Sum of every applicable boost for `cause_text`.
pub fn correlation_boost(cause_text: &str, input: &BoostInput<'_>) -> f64 {
    let lowered = cause_text.to_lowercase();
    BOOST_GROUPS
        .iter()
        .filter(|g| mentions_any(&lowered, g.keywords))
        .flat_map(|g| g.conditions.iter())
        .filter(|c| (c.holds)(input))
        .map(|c| c.amount)
        .sum()
}

/// Return a boosted copy of `cause`; the original is untouched.
pub fn apply_boost(cause: &Cause, input: &BoostInput<'_>) -> Cause {
    let boost = correlation_boost(&cause.cause, input);
    Cause {
        confidence: clamp_confidence(cause.confidence + boost),
        correlation_boost: boost,
        ..cause.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(errors: usize) -> LogSummary {
        let mut s = LogSummary::default();
        s.severity_breakdown.error = errors;
        s.total_logs = errors;
        s
    }

    fn boost_for(text: &str, metrics: &MetricSnapshot, errors: usize) -> f64 {
        let s = summary(errors);
        let t = BoostThresholds::default();
        correlation_boost(
            text,
            &BoostInput {
                metrics,
                summary: &s,
                thresholds: &t,
            },
        )
    }

    #[test]
    fn test_database_group_full() {
        let m = MetricSnapshot::new().with_db_latency(550.0);
        let b = boost_for("Database performance degradation", &m, 6);
        assert!((b - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_database_group_strict_thresholds() {
        let m = MetricSnapshot::new().with_db_latency(450.0);
        let b = boost_for("Database performance degradation", &m, 5);
        assert!((b - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_groups_are_cumulative() {
        // "DB connection timeout" hits both database and timeout groups
        let m = MetricSnapshot::new().with_db_latency(450.0);
        let b = boost_for("DB connection timeout", &m, 0);
        assert!((b - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_group() {
        let m = MetricSnapshot::new().with_cpu(92.0).with_requests_per_sec(1500);
        let b = boost_for("CPU resource exhaustion", &m, 0);
        assert!((b - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_memory_group_case_insensitive() {
        let m = MetricSnapshot::new().with_memory(90.0);
        assert!((boost_for("OOM killer invoked", &m, 0) - 0.15).abs() < 1e-9);
        assert_eq!(boost_for("OOM killer invoked", &MetricSnapshot::new(), 0), 0.0);
    }

    #[test]
    fn test_unrelated_cause_gets_nothing() {
        let m = MetricSnapshot::new()
            .with_cpu(99.0)
            .with_memory(99.0)
            .with_db_latency(900.0);
        assert_eq!(boost_for("Disk full on /var", &m, 50), 0.0);
    }

    #[test]
    fn test_apply_boost_is_pure_and_clamped() {
        let m = MetricSnapshot::new().with_db_latency(900.0);
        let s = summary(20);
        let t = BoostThresholds::default();
        let input = BoostInput {
            metrics: &m,
            summary: &s,
            thresholds: &t,
        };
        let original = Cause::new("Database connection timeout", 0.9);
        let boosted = apply_boost(&original, &input);
        assert_eq!(original.confidence, 0.9);
        assert_eq!(original.correlation_boost, 0.0);
        assert_eq!(boosted.confidence, 0.99);
        assert!((boosted.correlation_boost - 0.30).abs() < 1e-9);
    }
}
