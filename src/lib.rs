//! rootcause - log normalization and root-cause decisions for production
//! incidents.
//!
//! A batch of raw log lines (plus a snapshot of system metrics) flows
//! through four stages:
//!
//! - **Normalize**: recognise timestamp/level formats, infer severity
//! - **Preprocess**: deduplicate messages, bucket records into time windows
//! - **Propose**: ask an external reasoning service for candidate causes,
//!   falling back to deterministic rules
//! - **Decide**: boost candidates that agree with the metrics, rank them and
//!   synthesize an RCA document
//!
//! # Quick Start
//!
//! ```ignore
//! use rootcause::{Config, MetricSnapshot, Pipeline};
//!
//! let config = Config::load(None)?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let metrics = MetricSnapshot::new().with_db_latency(450.0);
//! let report = pipeline.analyze_lines(&lines, &metrics).await;
//! println!("{}", report.decision.summary_line());
//! ```

// ─── Core pipeline ─────────────────────────────────────────────────
pub mod decision;
pub mod log_analysis;
pub mod pipeline;
pub mod reasoning;

// ─── Outer surfaces ───────────────────────────────────────────────
pub mod api;
pub mod cli;
pub mod ingest;

// ─── Infrastructure ───────────────────────────────────────────────
pub mod config;
pub mod errors;
pub mod observability;

// ─── Test support ─────────────────────────────────────────────────
pub mod testing;

pub use config::Config;
pub use decision::{Decision, DecisionEngine};
pub use log_analysis::{LogRecord, LogSummary, MetricSnapshot, RawLogInput, Severity};
pub use pipeline::{AnalysisReport, Pipeline};
pub use reasoning::{Cause, CauseProposer, CauseSuggestions};
