//! Decision Engine
//!
//! Ranks candidate causes after correlating them with metrics, picks the
//! most likely one and synthesizes the RCA document around it.
//!
//! ```text
//! CauseSuggestions ──► boost ──► stable sort ──► top cause ──► Rca
//!                                                   │
//!                               next steps + correlated signals
//! ```
//!
//! The engine is pure: identical inputs and `now` give identical output.

pub mod boost;
pub mod rca;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::Thresholds;
use crate::log_analysis::{LogSummary, MetricSnapshot, Severity};
use crate::observability::scrub;
use crate::reasoning::{Cause, CauseSuggestions};
use boost::{apply_boost, BoostInput};
use rca::{dedup_preserving_order, ImpactSeverity, Rca, RcaContext};

/// Substring match against an already-lowercased text.
pub(crate) fn mentions_any(lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lowered.contains(k))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Medium,
}

/// A metric pattern that held regardless of which cause won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedSignal {
    pub signal: String,
    pub strength: SignalStrength,
    pub metrics: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub likely_cause: String,
    pub confidence: f64,
    pub reasoning: String,
    pub next_steps: Vec<String>,
    pub ai_suggestions: CauseSuggestions,
    pub correlated_signals: Vec<CorrelatedSignal>,
    /// Boosted candidates, descending by confidence.
    pub all_causes: Vec<Cause>,
    pub rca: Rca,
}

impl Decision {
    pub fn summary_line(&self) -> String {
        let level = match self.rca.impact.severity {
            ImpactSeverity::Critical => "Critical",
            ImpactSeverity::High => "High",
            ImpactSeverity::Medium | ImpactSeverity::Low => "Medium",
        };
        format!(
            "{} issue detected: {} (Confidence: {}%)",
            level,
            self.likely_cause,
            (self.confidence * 100.0).round() as i64
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    thresholds: Thresholds,
}

impl DecisionEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn decide(
        &self,
        suggestions: &CauseSuggestions,
        metrics: &MetricSnapshot,
        summary: &LogSummary,
    ) -> Decision {
        self.decide_at(suggestions, metrics, summary, Local::now().naive_local())
    }

    pub fn decide_at(
        &self,
        suggestions: &CauseSuggestions,
        metrics: &MetricSnapshot,
        summary: &LogSummary,
        now: NaiveDateTime,
    ) -> Decision {
        let ranked = self.rank(&suggestions.probable_causes, metrics, summary);
        let top = ranked.first().cloned().unwrap_or_else(Cause::unknown);

        let safe_cause = scrub(&top.cause);
        info!(
            cause = safe_cause.as_str(),
            confidence = top.confidence,
            candidates = ranked.len(),
            "Ranked top cause"
        );

        let ctx = RcaContext::new(&top, metrics, summary, &self.thresholds);
        let rca = rca::build_rca(&ctx, now);

        Decision {
            likely_cause: top.cause.clone(),
            confidence: top.confidence,
            reasoning: top.reasoning.clone(),
            next_steps: self.next_steps(&top, &suggestions.next_steps),
            ai_suggestions: suggestions.clone(),
            correlated_signals: self.correlated_signals(metrics, summary),
            all_causes: ranked,
            rca,
        }
    }

    /// Boost every candidate, then sort descending. The sort is stable so
    /// equal confidences keep their input order.
    pub fn rank(
        &self,
        candidates: &[Cause],
        metrics: &MetricSnapshot,
        summary: &LogSummary,
    ) -> Vec<Cause> {
        let input = BoostInput {
            metrics,
            summary,
            thresholds: &self.thresholds.boost,
        };
        let mut ranked: Vec<Cause> = candidates.iter().map(|c| apply_boost(c, &input)).collect();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        ranked
    }

    /// The top cause's own steps (or the suggestion-level defaults when it
    /// carries none) followed by category additions.
    pub fn next_steps(&self, top: &Cause, suggested: &[String]) -> Vec<String> {
        let mut steps: Vec<String> = if top.next_steps.is_empty() {
            suggested.to_vec()
        } else {
            top.next_steps.clone()
        };

        let lowered = top.cause.to_lowercase();
        if lowered.contains("database") {
            steps.extend(
                [
                    "Check database connection pool size",
                    "Review slow query log",
                    "Verify database server resources",
                ]
                .map(String::from),
            );
        }
        if lowered.contains("cpu") {
            steps.extend(
                [
                    "Profile application for CPU hotspots",
                    "Check for infinite loops or inefficient algorithms",
                ]
                .map(String::from),
            );
        }
        if lowered.contains("memory") {
            steps.extend(["Check for memory leaks", "Review object caching strategy"].map(String::from));
        }
        dedup_preserving_order(steps)
    }

    pub fn correlated_signals(
        &self,
        metrics: &MetricSnapshot,
        summary: &LogSummary,
    ) -> Vec<CorrelatedSignal> {
        let t = &self.thresholds.signals;
        let errors = summary.severity_breakdown.get(Severity::Error);
        let mut signals = Vec::new();

        if metrics.db_latency() > t.db_latency_ms && errors > 0 {
            signals.push(CorrelatedSignal {
                signal: "High DB latency with error spike".to_string(),
                strength: SignalStrength::Strong,
                metrics: BTreeMap::from([
                    ("db_latency".to_string(), serde_json::json!(metrics.db_latency())),
                    ("error_count".to_string(), serde_json::json!(errors)),
                ]),
            });
        }
        if metrics.cpu() > t.cpu_percent && metrics.requests_per_sec() > t.requests_per_sec {
            signals.push(CorrelatedSignal {
                signal: "CPU saturation under load".to_string(),
                strength: SignalStrength::Medium,
                metrics: BTreeMap::from([
                    ("cpu_usage".to_string(), serde_json::json!(metrics.cpu())),
                    (
                        "requests_per_sec".to_string(),
                        serde_json::json!(metrics.requests_per_sec()),
                    ),
                ]),
            });
        }
        if summary.window_count > t.sustained_windows {
            signals.push(CorrelatedSignal {
                signal: "Sustained issue across multiple time windows".to_string(),
                strength: SignalStrength::Medium,
                metrics: BTreeMap::from([(
                    "window_count".to_string(),
                    serde_json::json!(summary.window_count),
                )]),
            });
        }
        signals
    }
}
