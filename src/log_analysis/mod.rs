//! Log Analysis
//!
//! Normalization and preprocessing of raw log batches:
//!
//! ```text
//! raw line ──► normalizer ──► LogRecord ──► preprocess ──► LogSummary
//!                  │                            │
//!             severity rules               dedup + windows
//! ```
//!
//! Every stage is a pure function of its input (plus an injectable `now`),
//! so independent batches can be analysed concurrently without coordination.

pub mod metrics;
pub mod normalizer;
pub mod preprocess;
pub mod record;
pub mod severity;

pub use metrics::MetricSnapshot;
pub use normalizer::{
    diagnose, normalize, normalize_at, normalize_lines, parse_line, parse_line_at, LineFormat,
    ParseReport, ParseSample, ParsedLine,
};
pub use preprocess::{
    preprocess, preprocess_at, LogSummary, Preprocessor, RawLogInput, SeverityBreakdown,
    WindowKey,
};
pub use record::{parse_timestamp, LogRecord};
pub use severity::{infer_severity, Severity};
