//! Severity levels and keyword-based inference.
//!
//! Inference is an ordered rule table: the first rule whose keyword appears
//! (case-insensitively) in the text decides the severity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Map an explicit level token (e.g. the `ERROR` in `production.ERROR:`).
    ///
    /// Returns `None` for tokens outside the known vocabulary so the caller
    /// can fall back to inference.
    pub fn from_level_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "critical" | "crit" | "fatal" | "emergency" | "emerg" | "alert" => {
                Some(Severity::Critical)
            }
            "error" | "err" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "info" | "notice" | "debug" | "trace" => Some(Severity::Info),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the inference table.
#[derive(Debug, Clone, Copy)]
pub struct SeverityRule {
    pub keywords: &'static [&'static str],
    pub severity: Severity,
}

impl SeverityRule {
    /// `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Ordered inference rules, highest priority first.
pub const SEVERITY_RULES: &[SeverityRule] = &[
    SeverityRule {
        keywords: &["critical", "fatal"],
        severity: Severity::Critical,
    },
    SeverityRule {
        keywords: &["error", "exception"],
        severity: Severity::Error,
    },
    SeverityRule {
        keywords: &["warning", "warn"],
        severity: Severity::Warning,
    },
    SeverityRule {
        keywords: &["info", "notice"],
        severity: Severity::Info,
    },
];

/// Infer a severity from free text. Defaults to `Info`.
pub fn infer_severity(text: &str) -> Severity {
    let lowered = text.to_lowercase();
    SEVERITY_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.severity)
        .unwrap_or(Severity::Info)
}

/// Resolve an explicit level token, inferring from `fallback_text` when the
/// token is not a recognised level.
pub fn resolve_level(token: &str, fallback_text: &str) -> Severity {
    Severity::from_level_token(token).unwrap_or_else(|| infer_severity(fallback_text))
}
