//! Line Normalizer
//!
//! Turns one raw text line into a [`LogRecord`] using an ordered cascade of
//! formats; the first format that matches wins. Unrecognised lines are never
//! an error: they become a `Generic` record stamped with the processing time
//! and an inferred severity.
//!
//! ```text
//! [2024-02-14 10:30:45] production.ERROR: msg   -> BracketedLevel
//! [2024-02-14 10:30:45] msg                     -> Bracketed
//! 2024-02-14 10:30:45 WARNING: msg              -> TimestampLevel
//! 2024-02-14 10:30:45 msg                       -> TimestampPrefix
//! anything else                                 -> Generic
//! ```

use super::record::{parse_timestamp, LogRecord};
use super::severity::{infer_severity, resolve_level, Severity};
use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Shortest leading date/time prefix accepted as a timestamp.
const MIN_TIMESTAMP_PREFIX: usize = 10;

/// Message length kept in diagnostic reports.
const DIAGNOSTIC_MESSAGE_CHARS: usize = 100;

static BRACKETED_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\[(\d[\dT:.+\-/ Z]*)\]\s+\w+\.(\w+):\s+(.+)$").expect("static regex")
});

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\[(\d[\dT:.+\-/ Z]*)\]\s+(.+)$").expect("static regex"));

static TIMESTAMP_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(\d[\d\-/:.,T ]*?)\s+(ERROR|WARNING|INFO|CRITICAL|DEBUG|NOTICE):\s+(.+)$")
        .expect("static regex")
});

static TIMESTAMP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([\d\-/\s:.,]+)\s+(.+)$").expect("static regex"));

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("static regex"));

/// Which cascade step recognised a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// `[timestamp] env.LEVEL: message`
    BracketedLevel,
    /// `[timestamp] message`
    Bracketed,
    /// `timestamp LEVEL: message`
    TimestampLevel,
    /// `timestamp message`
    TimestampPrefix,
    /// No structure recognised
    Generic,
}

impl LineFormat {
    pub fn label(&self) -> &'static str {
        match self {
            LineFormat::BracketedLevel => "Bracketed timestamp with level",
            LineFormat::Bracketed => "Bracketed timestamp",
            LineFormat::TimestampLevel => "Plain timestamp with level",
            LineFormat::TimestampPrefix => "Timestamp prefix",
            LineFormat::Generic => "Generic (no timestamp)",
        }
    }
}

/// Result of a diagnostic parse: the record plus how it was recognised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedLine {
    pub format: LineFormat,
    /// Timestamp text as captured from the line, if any.
    pub timestamp_text: Option<String>,
    pub record: LogRecord,
}

/// Normalize a raw line, using the current local time for lines without a
/// usable timestamp.
pub fn normalize(raw_line: &str) -> LogRecord {
    normalize_at(raw_line, Local::now().naive_local())
}

/// Normalize a raw line with an explicit processing time.
pub fn normalize_at(raw_line: &str, now: NaiveDateTime) -> LogRecord {
    parse_line_at(raw_line, now).record
}

/// Diagnostic parse reporting the matched [`LineFormat`].
pub fn parse_line(raw_line: &str) -> ParsedLine {
    parse_line_at(raw_line, Local::now().naive_local())
}

pub fn parse_line_at(raw_line: &str, now: NaiveDateTime) -> ParsedLine {
    let line = raw_line.trim();

    if let Some(caps) = BRACKETED_LEVEL.captures(line) {
        let message = caps[3].trim();
        return build(
            LineFormat::BracketedLevel,
            &caps[1],
            resolve_level(&caps[2], message),
            message,
            raw_line,
            now,
        );
    }

    if let Some(caps) = BRACKETED.captures(line) {
        let message = caps[2].trim();
        return build(
            LineFormat::Bracketed,
            &caps[1],
            infer_severity(message),
            message,
            raw_line,
            now,
        );
    }

    if let Some(caps) = TIMESTAMP_LEVEL.captures(line) {
        let message = caps[3].trim();
        return build(
            LineFormat::TimestampLevel,
            &caps[1],
            resolve_level(&caps[2], message),
            message,
            raw_line,
            now,
        );
    }

    if let Some(caps) = TIMESTAMP_PREFIX.captures(line) {
        let stamp = caps[1].trim();
        if let Some((prefix, timestamp)) = parsable_prefix(stamp) {
            if prefix.len() >= MIN_TIMESTAMP_PREFIX {
                let message = line[prefix.len()..].trim();
                return ParsedLine {
                    format: LineFormat::TimestampPrefix,
                    timestamp_text: Some(prefix.to_string()),
                    record: LogRecord::new(timestamp, infer_severity(message), message)
                        .with_raw(raw_line),
                };
            }
        }
        // Fractional separators only count once the prefix actually parses.
        if stamp.len() >= MIN_TIMESTAMP_PREFIX && !stamp.contains(['.', ',']) {
            let message = caps[2].trim();
            return build(
                LineFormat::TimestampPrefix,
                stamp,
                infer_severity(message),
                message,
                raw_line,
                now,
            );
        }
    }

    ParsedLine {
        format: LineFormat::Generic,
        timestamp_text: None,
        record: LogRecord::new(now, infer_severity(line), line).with_raw(raw_line),
    }
}

/// Longest run of leading whitespace-separated tokens of `stamp` that parses
/// as a timestamp. Digits that open the message end up in the capture, so the
/// prefix is shrunk one token at a time.
fn parsable_prefix(stamp: &str) -> Option<(&str, NaiveDateTime)> {
    let ends: Vec<usize> = TOKEN.find_iter(stamp).map(|m| m.end()).collect();
    ends.into_iter().rev().find_map(|end| {
        let candidate = &stamp[..end];
        parse_timestamp(candidate).map(|ts| (candidate, ts))
    })
}

fn build(
    format: LineFormat,
    stamp: &str,
    severity: Severity,
    message: &str,
    raw_line: &str,
    now: NaiveDateTime,
) -> ParsedLine {
    let stamp = stamp.trim();
    let timestamp = parse_timestamp(stamp).unwrap_or_else(|| {
        debug!(timestamp = stamp, "Unparsable timestamp, using processing time");
        now
    });
    ParsedLine {
        format,
        timestamp_text: Some(stamp.to_string()),
        record: LogRecord::new(timestamp, severity, message).with_raw(raw_line),
    }
}

/// Normalize every non-blank line of a batch.
pub fn normalize_lines<'a, I>(lines: I, now: NaiveDateTime) -> Vec<LogRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut generic = 0usize;
    let records: Vec<LogRecord> = lines
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let parsed = parse_line_at(l, now);
            if parsed.format == LineFormat::Generic {
                generic += 1;
            }
            parsed.record
        })
        .collect();

    debug!(
        lines = records.len(),
        generic_fallbacks = generic,
        "Normalized log lines"
    );
    records
}

/// One line of a [`ParseReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseSample {
    pub line_number: usize,
    pub original: String,
    pub format: LineFormat,
    pub timestamp: Option<String>,
    pub severity: Severity,
    pub message: String,
}

/// Diagnostic summary of how a sample of lines was recognised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseReport {
    pub lines_checked: usize,
    pub structured: usize,
    pub generic: usize,
    pub by_format: BTreeMap<LineFormat, usize>,
    pub samples: Vec<ParseSample>,
}

impl ParseReport {
    /// Percentage of checked lines that matched a structured format.
    pub fn structured_rate(&self) -> f64 {
        if self.lines_checked == 0 {
            return 0.0;
        }
        (self.structured as f64 / self.lines_checked as f64 * 10_000.0).round() / 100.0
    }
}

/// Diagnose up to `max_lines` non-blank lines.
pub fn diagnose<'a, I>(lines: I, max_lines: usize) -> ParseReport
where
    I: IntoIterator<Item = &'a str>,
{
    let now = Local::now().naive_local();
    let mut report = ParseReport {
        lines_checked: 0,
        structured: 0,
        generic: 0,
        by_format: BTreeMap::new(),
        samples: Vec::new(),
    };

    for (idx, line) in lines.into_iter().enumerate() {
        if report.lines_checked >= max_lines {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let parsed = parse_line_at(line, now);
        report.lines_checked += 1;
        if parsed.format == LineFormat::Generic {
            report.generic += 1;
        } else {
            report.structured += 1;
        }
        *report.by_format.entry(parsed.format).or_insert(0) += 1;

        report.samples.push(ParseSample {
            line_number: idx + 1,
            original: truncate(line.trim(), 150),
            format: parsed.format,
            timestamp: parsed.timestamp_text,
            severity: parsed.record.severity,
            message: truncate(&parsed.record.message, DIAGNOSTIC_MESSAGE_CHARS),
        });
    }

    report
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
