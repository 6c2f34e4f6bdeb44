//! System metrics supplied alongside a log batch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time system metrics. Every field is optional; the accessors
/// treat missing, negative or non-finite values as `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    #[serde(default)]
    pub cpu_usage: Option<f64>,
    #[serde(default)]
    pub memory_usage: Option<f64>,
    /// Milliseconds
    #[serde(default)]
    pub db_latency: Option<f64>,
    #[serde(default)]
    pub requests_per_sec: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, serde_json::Value>,
}

impl MetricSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cpu(mut self, value: f64) -> Self {
        self.cpu_usage = Some(value);
        self
    }

    pub fn with_memory(mut self, value: f64) -> Self {
        self.memory_usage = Some(value);
        self
    }

    pub fn with_db_latency(mut self, value: f64) -> Self {
        self.db_latency = Some(value);
        self
    }

    pub fn with_requests_per_sec(mut self, value: i64) -> Self {
        self.requests_per_sec = Some(value);
        self
    }

    pub fn cpu(&self) -> f64 {
        non_negative(self.cpu_usage)
    }

    pub fn memory(&self) -> f64 {
        non_negative(self.memory_usage)
    }

    pub fn db_latency(&self) -> f64 {
        non_negative(self.db_latency)
    }

    pub fn requests_per_sec(&self) -> u64 {
        self.requests_per_sec
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0)
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}
