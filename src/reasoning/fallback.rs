//! Deterministic cause rules used when no external reasoning is available.

use super::{Cause, CauseSuggestions, SuggestionSource};
use crate::config::thresholds::FallbackThresholds;
use crate::log_analysis::{LogSummary, MetricSnapshot, Severity};

pub const DEFAULT_NEXT_STEPS: [&str; 3] = [
    "Check database connection pool",
    "Review slow queries",
    "Monitor resource usage",
];

pub const DEFAULT_CORRELATIONS: [&str; 1] = ["High latency correlates with error spike"];

/// Inputs every rule sees.
pub struct RuleContext<'a> {
    pub summary: &'a LogSummary,
    pub metrics: &'a MetricSnapshot,
    pub thresholds: &'a FallbackThresholds,
}

/// One `(predicate, result)` pair of the fallback table.
pub struct FallbackRule {
    pub name: &'static str,
    pub applies: fn(&RuleContext<'_>) -> bool,
    pub build: fn(&RuleContext<'_>) -> Cause,
}

pub static FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        name: "database_degradation",
        applies: |ctx| {
            ctx.metrics.db_latency() > ctx.thresholds.db_latency_ms
                && ctx.summary.severity_breakdown.get(Severity::Error) > 0
        },
        build: |ctx| {
            Cause::new("Database performance degradation", 0.75)
                .with_reasoning("High DB latency combined with database errors")
                .with_evidence(vec![
                    format!("DB latency: {}ms", ctx.metrics.db_latency()),
                    format!(
                        "Error count: {}",
                        ctx.summary.severity_breakdown.get(Severity::Error)
                    ),
                ])
        },
    },
    FallbackRule {
        name: "cpu_exhaustion",
        applies: |ctx| ctx.metrics.cpu() > ctx.thresholds.cpu_percent,
        build: |ctx| {
            Cause::new("CPU resource exhaustion", 0.65)
                .with_reasoning(format!(
                    "CPU usage exceeds {}%",
                    ctx.thresholds.cpu_percent
                ))
                .with_evidence(vec![format!("CPU: {}%", ctx.metrics.cpu())])
        },
    },
];

/// Evaluate every rule independently; any subset may fire.
pub fn analyze(
    summary: &LogSummary,
    metrics: &MetricSnapshot,
    thresholds: &FallbackThresholds,
) -> CauseSuggestions {
    let ctx = RuleContext {
        summary,
        metrics,
        thresholds,
    };

    let probable_causes = FALLBACK_RULES
        .iter()
        .filter(|rule| (rule.applies)(&ctx))
        .map(|rule| {
            tracing::debug!(rule = rule.name, "Fallback rule fired");
            (rule.build)(&ctx)
        })
        .collect();

    CauseSuggestions {
        probable_causes,
        next_steps: DEFAULT_NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
        correlations: DEFAULT_CORRELATIONS.iter().map(|s| s.to_string()).collect(),
        source: SuggestionSource::Fallback,
    }
}
