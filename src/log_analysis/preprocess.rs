//! Preprocessor
//!
//! Resolves timestamps and severities for a batch of inputs, marks repeated
//! messages as duplicates (globally, first occurrence wins) and groups the
//! records into fixed-width time windows.

use super::record::{parse_timestamp, LogRecord, TIMESTAMP_FORMAT};
use super::severity::{infer_severity, Severity};
use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

pub const DEFAULT_WINDOW_MINUTES: u32 = 10;

/// One input of a batch. Only `message` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLogInput {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Severity already known to the caller; inferred from `message` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl RawLogInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

impl From<&LogRecord> for RawLogInput {
    fn from(record: &LogRecord) -> Self {
        Self {
            message: record.message.clone(),
            timestamp: Some(record.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            raw: Some(record.raw.clone()),
            severity: Some(record.severity),
        }
    }
}

/// Start of a time window, truncated to the window width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowKey(NaiveDateTime);

impl WindowKey {
    /// Floor `ts` to a `width_minutes` bucket using minutes since midnight,
    /// so e.g. `10:07` falls in `10:00` and `09:59` in `09:50`.
    pub fn for_timestamp(ts: NaiveDateTime, width_minutes: u32) -> Self {
        let width = width_minutes.clamp(1, 24 * 60);
        let minute_of_day = ts.hour() * 60 + ts.minute();
        let floored = minute_of_day - minute_of_day % width;
        let time = NaiveTime::from_hms_opt(floored / 60, floored % 60, 0).unwrap_or_default();
        WindowKey(ts.date().and_time(time))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl Serialize for WindowKey {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WindowKey {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let text = String::deserialize(d)?;
        parse_timestamp(&text)
            .map(WindowKey)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid window key: {}", text)))
    }
}

/// Per-severity record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    #[serde(default)]
    pub critical: usize,
    #[serde(default)]
    pub error: usize,
    #[serde(default)]
    pub warning: usize,
    #[serde(default)]
    pub info: usize,
}

impl SeverityBreakdown {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }

    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.error + self.warning + self.info
    }
}

/// Batch summary handed to the analyzer and decision engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub total_logs: usize,
    pub severity_breakdown: SeverityBreakdown,
    /// Messages of non-duplicate records, first-seen order.
    pub unique_messages: Vec<String>,
    /// Distinct windows, first-seen order.
    pub time_windows: Vec<WindowKey>,
    pub window_count: usize,
}

impl LogSummary {
    /// Errors plus criticals.
    pub fn total_errors(&self) -> usize {
        self.severity_breakdown.error + self.severity_breakdown.critical
    }
}

/// Batch preprocessor.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    window_minutes: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MINUTES)
    }
}

impl Preprocessor {
    pub fn new(window_minutes: u32) -> Self {
        Self {
            window_minutes: window_minutes.max(1),
        }
    }

    pub fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    pub fn process(&self, inputs: &[RawLogInput]) -> (LogSummary, Vec<LogRecord>) {
        self.process_at(inputs, Local::now().naive_local())
    }

    /// Process with an explicit processing time (used for missing or
    /// unparsable timestamps).
    pub fn process_at(
        &self,
        inputs: &[RawLogInput],
        now: NaiveDateTime,
    ) -> (LogSummary, Vec<LogRecord>) {
        let mut seen: HashSet<&str> = HashSet::with_capacity(inputs.len());
        let mut windows: Vec<WindowKey> = Vec::new();
        let mut window_index: HashMap<WindowKey, usize> = HashMap::new();
        let mut grouped: Vec<Vec<LogRecord>> = Vec::new();
        let mut unique_messages: Vec<String> = Vec::new();

        for input in inputs {
            let timestamp = input
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(now);
            let severity = input
                .severity
                .unwrap_or_else(|| infer_severity(&input.message));
            let is_duplicate = !seen.insert(input.message.as_str());
            if !is_duplicate {
                unique_messages.push(input.message.clone());
            }

            let record = LogRecord {
                timestamp,
                severity,
                message: input.message.clone(),
                raw: input.raw.clone().unwrap_or_else(|| input.message.clone()),
                is_duplicate,
            };

            let key = WindowKey::for_timestamp(timestamp, self.window_minutes);
            let slot = *window_index.entry(key).or_insert_with(|| {
                windows.push(key);
                grouped.push(Vec::new());
                grouped.len() - 1
            });
            grouped[slot].push(record);
        }

        let records: Vec<LogRecord> = grouped.into_iter().flatten().collect();
        let summary = summarize(&records, windows, unique_messages);

        debug!(
            total = summary.total_logs,
            unique = summary.unique_messages.len(),
            windows = summary.window_count,
            errors = summary.severity_breakdown.error,
            critical = summary.severity_breakdown.critical,
            "Preprocessed log batch"
        );

        (summary, records)
    }
}

/// Preprocess with the default 10-minute window.
pub fn preprocess(inputs: &[RawLogInput]) -> (LogSummary, Vec<LogRecord>) {
    Preprocessor::default().process(inputs)
}

pub fn preprocess_at(inputs: &[RawLogInput], now: NaiveDateTime) -> (LogSummary, Vec<LogRecord>) {
    Preprocessor::default().process_at(inputs, now)
}

fn summarize(
    records: &[LogRecord],
    windows: Vec<WindowKey>,
    unique_messages: Vec<String>,
) -> LogSummary {
    let mut breakdown = SeverityBreakdown::default();
    for record in records {
        breakdown.record(record.severity);
    }

    LogSummary {
        total_logs: records.len(),
        severity_breakdown: breakdown,
        unique_messages,
        window_count: windows.len(),
        time_windows: windows,
    }
}
