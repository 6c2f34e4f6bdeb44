//! Reading log batches from disk or stdin.
//!
//! Two input shapes are accepted: plain text logs (one line per record) and
//! JSON batch requests carrying pre-split entries plus metrics. Both are
//! validated here so the pipeline itself never has to fail.

use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{InputError, RcaError, Result};
use crate::log_analysis::{MetricSnapshot, RawLogInput, Severity};

/// Path value meaning "read from stdin".
pub const STDIN_PATH: &str = "-";

/// A validated JSON batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRequest {
    pub logs: Vec<RawLogInput>,
    pub metrics: MetricSnapshot,
}

impl BatchRequest {
    /// Keep only the last `n` log entries.
    pub fn keep_last(mut self, n: usize) -> Self {
        if n < self.logs.len() {
            self.logs.drain(..self.logs.len() - n);
        }
        self
    }
}

#[derive(Deserialize)]
struct WireEntry {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    severity: Option<Severity>,
}

#[derive(Deserialize)]
struct WireBatch {
    logs: Option<Vec<WireEntry>>,
    #[serde(default)]
    metrics: MetricSnapshot,
}

/// Invalid UTF-8 is replaced rather than rejected; one bad byte must not
/// fail the whole batch.
fn read_source(path: &str) -> Result<String> {
    let bytes = if path == STDIN_PATH {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|source| RcaError::Io {
                path: PathBuf::from("<stdin>"),
                source,
            })?;
        buf
    } else {
        std::fs::read(Path::new(path)).map_err(|source| RcaError::Io {
            path: PathBuf::from(path),
            source,
        })?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Trimmed, non-empty lines of `text`, keeping only the last `tail` when set.
pub fn split_lines(text: &str, tail: Option<usize>) -> Vec<String> {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    match tail {
        Some(n) if n < lines.len() => lines[lines.len() - n..].to_vec(),
        _ => lines,
    }
}

/// Read a text log (or stdin for `-`).
pub fn read_lines(path: &str, tail: Option<usize>) -> Result<Vec<String>> {
    let text = read_source(path)?;
    let lines = split_lines(&text, tail);
    if lines.is_empty() {
        return Err(InputError::NoLogsFound {
            path: path.to_string(),
        }
        .into());
    }
    debug!(lines = lines.len(), tail = ?tail, "Read log lines");
    Ok(lines)
}

/// Read and validate a JSON batch request (or stdin for `-`).
pub fn read_batch(path: &str) -> Result<BatchRequest> {
    let text = read_source(path)?;
    parse_batch(&text)
}

pub fn parse_batch(text: &str) -> Result<BatchRequest> {
    let wire: WireBatch =
        serde_json::from_str(text).map_err(|e| InputError::InvalidJson(e.to_string()))?;

    let entries = wire.logs.unwrap_or_default();
    if entries.is_empty() {
        return Err(InputError::EmptyBatch.into());
    }

    let mut logs = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let message = match entry.message {
            Some(m) if !m.trim().is_empty() => m,
            _ => return Err(InputError::MissingMessage { index }.into()),
        };
        logs.push(RawLogInput {
            message,
            timestamp: entry.timestamp,
            raw: entry.raw,
            severity: entry.severity,
        });
    }

    validate_metrics(&wire.metrics)?;
    Ok(BatchRequest {
        logs,
        metrics: wire.metrics,
    })
}

/// Range checks for caller-supplied metrics.
pub fn validate_metrics(metrics: &MetricSnapshot) -> std::result::Result<(), InputError> {
    let percent = |field: &str, value: Option<f64>| match value {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(out_of_range(field, v)),
        _ => Ok(()),
    };
    percent("cpu_usage", metrics.cpu_usage)?;
    percent("memory_usage", metrics.memory_usage)?;

    if let Some(v) = metrics.db_latency {
        if v.is_nan() || v < 0.0 {
            return Err(out_of_range("db_latency", v));
        }
    }
    if let Some(v) = metrics.requests_per_sec {
        if v < 0 {
            return Err(out_of_range("requests_per_sec", v as f64));
        }
    }
    Ok(())
}

fn out_of_range(field: &str, value: f64) -> InputError {
    InputError::MetricOutOfRange {
        field: field.to_string(),
        value,
    }
}
