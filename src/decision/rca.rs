//! Root cause analysis document.
//!
//! Everything here is derived from the top-ranked cause, the metrics, the
//! batch summary and an injected `now`.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::mentions_any;
use crate::config::thresholds::{HealthBand, Thresholds};
use crate::log_analysis::record::timestamp_serde;
use crate::log_analysis::{LogSummary, MetricSnapshot};
use crate::reasoning::Cause;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rca {
    pub root_cause: String,
    pub confidence: f64,
    pub timeline: Timeline,
    pub impact: Impact,
    pub five_whys: Vec<WhyStep>,
    pub contributing_factors: Vec<String>,
    pub evidence: Vec<String>,
    pub immediate_actions: Vec<ImmediateAction>,
    pub prevention_steps: Vec<String>,
    pub lessons_learned: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Analyzed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(with = "timestamp_serde")]
    pub incident_detected: NaiveDateTime,
    #[serde(with = "timestamp_serde")]
    pub estimated_start: NaiveDateTime,
    pub duration_minutes: u64,
    pub time_windows_affected: usize,
    pub status: IncidentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImpactSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactSeverity::Low => "LOW",
            ImpactSeverity::Medium => "MEDIUM",
            ImpactSeverity::High => "HIGH",
            ImpactSeverity::Critical => "CRITICAL",
        }
    }

    pub fn business_impact(&self) -> &'static str {
        match self {
            ImpactSeverity::Critical => "Severe service degradation - immediate action required",
            ImpactSeverity::High => "Significant impact on user experience",
            ImpactSeverity::Medium => "Moderate impact - some users affected",
            ImpactSeverity::Low => "Minor impact - isolated incidents",
        }
    }
}

impl fmt::Display for ImpactSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Higher is worse; a value at the threshold reaches that level.
    pub fn classify(value: f64, band: &HealthBand) -> Self {
        if value >= band.critical {
            HealthStatus::Critical
        } else if value >= band.warning {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub cpu: HealthStatus,
    pub memory: HealthStatus,
    pub db: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub severity: ImpactSeverity,
    pub total_errors: usize,
    pub critical_errors: usize,
    pub error_rate_percentage: f64,
    pub estimated_affected_requests: u64,
    pub business_impact: String,
    pub system_health: SystemHealth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhyStep {
    pub why: String,
    pub answer: String,
}

impl WhyStep {
    fn new(why: &str, answer: impl Into<String>) -> Self {
        Self {
            why: why.to_string(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Urgent,
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmediateAction {
    pub priority: ActionPriority,
    pub action: String,
}

impl ImmediateAction {
    fn new(priority: ActionPriority, action: &str) -> Self {
        Self {
            priority,
            action: action.to_string(),
        }
    }
}

impl fmt::Display for ImmediateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.priority {
            ActionPriority::Urgent => write!(f, "URGENT: {}", self.action),
            _ => f.write_str(&self.action),
        }
    }
}

const DATABASE_KEYWORDS: &[&str] = &["database", "connection"];
const CPU_KEYWORDS: &[&str] = &["cpu", "resource"];
const MEMORY_KEYWORDS: &[&str] = &["memory", "oom"];

/// Inputs shared by every synthesis step.
pub struct RcaContext<'a> {
    pub cause: &'a Cause,
    pub lowered: String,
    pub metrics: &'a MetricSnapshot,
    pub summary: &'a LogSummary,
    pub thresholds: &'a Thresholds,
}

impl<'a> RcaContext<'a> {
    pub fn new(
        cause: &'a Cause,
        metrics: &'a MetricSnapshot,
        summary: &'a LogSummary,
        thresholds: &'a Thresholds,
    ) -> Self {
        Self {
            cause,
            lowered: cause.cause.to_lowercase(),
            metrics,
            summary,
            thresholds,
        }
    }

    fn mentions(&self, keywords: &[&str]) -> bool {
        mentions_any(&self.lowered, keywords)
    }

    fn incident_minutes(&self) -> u64 {
        (self.summary.window_count as u64).saturating_mul(self.thresholds.rca.minutes_per_window)
    }
}

pub fn build_rca(ctx: &RcaContext<'_>, now: NaiveDateTime) -> Rca {
    Rca {
        root_cause: ctx.cause.cause.clone(),
        confidence: ctx.cause.confidence,
        timeline: timeline(ctx, now),
        impact: assess_impact(ctx),
        five_whys: five_whys(ctx),
        contributing_factors: contributing_factors(ctx),
        evidence: ctx.cause.evidence.clone(),
        immediate_actions: immediate_actions(ctx),
        prevention_steps: prevention_steps(ctx),
        lessons_learned: lessons_learned(ctx),
    }
}

pub fn timeline(ctx: &RcaContext<'_>, now: NaiveDateTime) -> Timeline {
    let duration = ctx.incident_minutes();
    let start = i64::try_from(duration)
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(now);
    Timeline {
        incident_detected: now,
        estimated_start: start,
        duration_minutes: duration,
        time_windows_affected: ctx.summary.window_count,
        status: IncidentStatus::Analyzed,
    }
}

pub fn impact_severity(summary: &LogSummary, high_error_count: usize) -> ImpactSeverity {
    let total_errors = summary.total_errors();
    if summary.severity_breakdown.critical > 0 {
        ImpactSeverity::Critical
    } else if total_errors > high_error_count {
        ImpactSeverity::High
    } else if total_errors > 0 {
        ImpactSeverity::Medium
    } else {
        ImpactSeverity::Low
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn assess_impact(ctx: &RcaContext<'_>) -> Impact {
    let summary = ctx.summary;
    let total_errors = summary.total_errors();
    let severity = impact_severity(summary, ctx.thresholds.rca.high_error_count);

    let error_rate = total_errors as f64 / summary.total_logs.max(1) as f64 * 100.0;
    let affected = ctx.metrics.requests_per_sec() as f64
        * ctx.incident_minutes() as f64
        * (error_rate / 100.0);

    let health = &ctx.thresholds.health;
    Impact {
        severity,
        total_errors,
        critical_errors: summary.severity_breakdown.critical,
        error_rate_percentage: round2(error_rate),
        estimated_affected_requests: affected.round() as u64,
        business_impact: severity.business_impact().to_string(),
        system_health: SystemHealth {
            cpu: HealthStatus::classify(ctx.metrics.cpu(), &health.cpu),
            memory: HealthStatus::classify(ctx.metrics.memory(), &health.memory),
            db: HealthStatus::classify(ctx.metrics.db_latency(), &health.db_latency),
        },
    }
}

pub fn five_whys(ctx: &RcaContext<'_>) -> Vec<WhyStep> {
    let m = ctx.metrics;
    if ctx.mentions(DATABASE_KEYWORDS) {
        vec![
            WhyStep::new("Why did the application fail?", "Database connections timed out"),
            WhyStep::new(
                "Why did connections timeout?",
                format!("Database was slow to respond (latency: {}ms)", m.db_latency()),
            ),
            WhyStep::new("Why was database slow?", "High query load or inefficient queries"),
            WhyStep::new(
                "Why was there high query load?",
                format!("Traffic spike ({} req/sec)", m.requests_per_sec()),
            ),
            WhyStep::new(
                "Why couldn't system handle the load?",
                "Connection pool or query optimization not configured for peak load",
            ),
        ]
    } else if ctx.mentions(CPU_KEYWORDS) {
        vec![
            WhyStep::new(
                "Why is the application slow?",
                format!("CPU usage is high ({}%)", m.cpu()),
            ),
            WhyStep::new(
                "Why is CPU usage high?",
                "Processing too many requests or inefficient code",
            ),
            WhyStep::new(
                "Why is code inefficient?",
                "Possible infinite loops, heavy computations, or missing caching",
            ),
            WhyStep::new(
                "Why wasn't this caught earlier?",
                "Insufficient load testing or monitoring",
            ),
            WhyStep::new(
                "Why no monitoring alerts?",
                "Alert thresholds not configured or too high",
            ),
        ]
    } else if ctx.mentions(MEMORY_KEYWORDS) {
        vec![
            WhyStep::new(
                "Why did the application crash?",
                format!("Out of memory error (usage: {}%)", m.memory()),
            ),
            WhyStep::new("Why did memory run out?", "Memory leak or large data processing"),
            WhyStep::new(
                "Why is there a memory leak?",
                "Objects not being garbage collected or caching issues",
            ),
            WhyStep::new(
                "Why weren't objects released?",
                "Improper resource management in code",
            ),
            WhyStep::new(
                "Why wasn't this detected?",
                "No memory profiling or monitoring in place",
            ),
        ]
    } else {
        vec![
            WhyStep::new("Why did the issue occur?", ctx.cause.cause.clone()),
            WhyStep::new("Why did this cause problems?", ctx.cause.reasoning.clone()),
            WhyStep::new("Why wasn't it prevented?", "Insufficient monitoring or testing"),
            WhyStep::new("Why no monitoring?", "Alert thresholds not configured"),
            WhyStep::new("Why not configured?", "Needs review of monitoring strategy"),
        ]
    }
}

pub fn contributing_factors(ctx: &RcaContext<'_>) -> Vec<String> {
    let m = ctx.metrics;
    let t = &ctx.thresholds.rca;
    let mut factors = Vec::new();

    if m.requests_per_sec() > t.factor_requests_per_sec {
        factors.push(format!(
            "High traffic load ({} requests/sec)",
            m.requests_per_sec()
        ));
    }
    if m.cpu() > t.factor_cpu_percent {
        factors.push(format!("Elevated CPU usage ({}%)", m.cpu()));
    }
    if m.memory() > t.factor_memory_percent {
        factors.push(format!("High memory usage ({}%)", m.memory()));
    }
    if m.db_latency() > t.factor_db_latency_ms {
        factors.push(format!("Slow database response ({}ms)", m.db_latency()));
    }

    let critical = ctx.summary.severity_breakdown.critical;
    if critical > 0 {
        factors.push(format!("Critical errors present ({} occurrences)", critical));
    }
    if ctx.summary.window_count > t.sustained_windows {
        factors.push(format!(
            "Sustained issue across {} time windows",
            ctx.summary.window_count
        ));
    }

    if ctx.mentions(&["connection"]) {
        factors.push("Possible connection pool exhaustion".to_string());
    }
    if ctx.mentions(&["timeout"]) {
        factors.push("Network or query timeout issues".to_string());
    }
    factors
}

pub fn immediate_actions(ctx: &RcaContext<'_>) -> Vec<ImmediateAction> {
    use ActionPriority::*;
    let t = &ctx.thresholds.rca;
    let mut actions = Vec::new();

    if ctx.mentions(DATABASE_KEYWORDS) {
        actions.extend([
            ImmediateAction::new(Urgent, "Increase database connection pool size"),
            ImmediateAction::new(High, "Check database server health and resources"),
            ImmediateAction::new(Medium, "Review and kill long-running queries"),
            ImmediateAction::new(Medium, "Enable query caching if not already enabled"),
        ]);
    }
    if ctx.mentions(&["cpu"]) || ctx.metrics.cpu() > t.action_cpu_percent {
        actions.extend([
            ImmediateAction::new(Urgent, "Scale up application servers"),
            ImmediateAction::new(Medium, "Profile application to identify CPU hotspots"),
            ImmediateAction::new(Medium, "Check for infinite loops or heavy computations"),
        ]);
    }
    if ctx.mentions(&["memory"]) || ctx.metrics.memory() > t.action_memory_percent {
        actions.extend([
            ImmediateAction::new(Urgent, "Restart affected services to free memory"),
            ImmediateAction::new(Medium, "Check for memory leaks"),
            ImmediateAction::new(Medium, "Review caching strategy"),
        ]);
    }
    if actions.is_empty() {
        actions.extend([
            ImmediateAction::new(Medium, "Review application logs for detailed error messages"),
            ImmediateAction::new(Medium, "Check system resources (CPU, Memory, Disk)"),
            ImmediateAction::new(Medium, "Verify external service dependencies"),
        ]);
    }
    actions
}

pub fn prevention_steps(ctx: &RcaContext<'_>) -> Vec<String> {
    let mut steps: Vec<&str> = Vec::new();

    if ctx.mentions(&["database"]) {
        steps.extend([
            "Implement auto-scaling for database connection pool",
            "Set up monitoring alerts for DB latency > 200ms",
            "Regular database query optimization reviews",
            "Implement read replicas for load distribution",
        ]);
    }
    if ctx.mentions(&["cpu", "performance"]) {
        steps.extend([
            "Implement horizontal auto-scaling based on CPU metrics",
            "Regular performance profiling and optimization",
            "Load testing before major releases",
            "Implement caching strategy (Redis/Memcached)",
        ]);
    }
    if ctx.mentions(&["memory"]) {
        steps.extend([
            "Regular memory profiling to detect leaks",
            "Implement memory limits and monitoring",
            "Review object lifecycle and garbage collection",
        ]);
    }
    steps.extend([
        "Set up comprehensive monitoring and alerting",
        "Implement circuit breakers for external dependencies",
        "Regular disaster recovery drills",
        "Document runbooks for common incidents",
    ]);

    dedup_preserving_order(steps.into_iter().map(str::to_string))
}

pub fn lessons_learned(ctx: &RcaContext<'_>) -> Vec<String> {
    let t = &ctx.thresholds.rca;
    let mut lessons = Vec::new();

    if ctx.mentions(&["connection", "pool"]) {
        lessons.push("Connection pool size was not optimized for peak load".to_string());
        lessons.push("Need better capacity planning for database connections".to_string());
    }
    if ctx.summary.window_count > t.lesson_windows {
        lessons.push(format!(
            "Issue persisted for {} minutes before detection",
            ctx.incident_minutes()
        ));
        lessons.push("Need faster alerting for critical errors".to_string());
    }
    if ctx.metrics.cpu() > t.lesson_resource_percent
        || ctx.metrics.memory() > t.lesson_resource_percent
    {
        lessons.push("Resource thresholds need to be reviewed and adjusted".to_string());
        lessons.push("Auto-scaling should trigger earlier".to_string());
    }
    lessons.push("Load testing scenarios should include this failure mode".to_string());
    lessons.push("Need better monitoring dashboards for quick diagnosis".to_string());

    dedup_preserving_order(lessons)
}

/// Drop repeats, keeping the first occurrence.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
