//! Numeric thresholds used by the fallback analyzer and the decision engine.
//!
//! Every comparison is strict (`value > threshold`) except the health
//! status levels, which trigger at or above their threshold.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub fallback: FallbackThresholds,
    pub boost: BoostThresholds,
    pub signals: SignalThresholds,
    pub health: HealthThresholds,
    pub rca: RcaThresholds,
}

/// Rule-based cause proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackThresholds {
    pub db_latency_ms: f64,
    pub cpu_percent: f64,
}

impl Default for FallbackThresholds {
    fn default() -> Self {
        Self {
            db_latency_ms: 300.0,
            cpu_percent: 80.0,
        }
    }
}

/// Correlation boost triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostThresholds {
    pub db_latency_ms: f64,
    pub db_latency_severe_ms: f64,
    pub error_count: usize,
    pub cpu_percent: f64,
    pub requests_per_sec: u64,
    pub memory_percent: f64,
    pub timeout_latency_ms: f64,
}

impl Default for BoostThresholds {
    fn default() -> Self {
        Self {
            db_latency_ms: 300.0,
            db_latency_severe_ms: 500.0,
            error_count: 5,
            cpu_percent: 80.0,
            requests_per_sec: 1000,
            memory_percent: 85.0,
            timeout_latency_ms: 400.0,
        }
    }
}

/// Correlated signal detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub db_latency_ms: f64,
    pub cpu_percent: f64,
    pub requests_per_sec: u64,
    pub sustained_windows: usize,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            db_latency_ms: 300.0,
            cpu_percent: 75.0,
            requests_per_sec: 500,
            sustained_windows: 3,
        }
    }
}

/// Warning/critical pair for one health indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthBand {
    pub warning: f64,
    pub critical: f64,
}

/// System health classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    pub cpu: HealthBand,
    pub memory: HealthBand,
    pub db_latency: HealthBand,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            cpu: HealthBand {
                warning: 80.0,
                critical: 90.0,
            },
            memory: HealthBand {
                warning: 80.0,
                critical: 90.0,
            },
            db_latency: HealthBand {
                warning: 300.0,
                critical: 500.0,
            },
        }
    }
}

/// RCA synthesis: impact, contributing factors, actions and lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcaThresholds {
    /// Window count is converted to an incident duration with this factor.
    pub minutes_per_window: u64,
    pub high_error_count: usize,
    pub factor_requests_per_sec: u64,
    pub factor_cpu_percent: f64,
    pub factor_memory_percent: f64,
    pub factor_db_latency_ms: f64,
    pub sustained_windows: usize,
    pub action_cpu_percent: f64,
    pub action_memory_percent: f64,
    pub lesson_windows: usize,
    pub lesson_resource_percent: f64,
}

impl Default for RcaThresholds {
    fn default() -> Self {
        Self {
            minutes_per_window: 5,
            high_error_count: 10,
            factor_requests_per_sec: 500,
            factor_cpu_percent: 75.0,
            factor_memory_percent: 80.0,
            factor_db_latency_ms: 300.0,
            sustained_windows: 3,
            action_cpu_percent: 80.0,
            action_memory_percent: 85.0,
            lesson_windows: 2,
            lesson_resource_percent: 80.0,
        }
    }
}
