//! Observability module
//!
//! Structured logging setup and log-safety helpers.

pub mod telemetry;

pub use telemetry::{
    init_tracing, init_tracing_verbose, sanitize_for_log, scrub, time_stage, track_stage,
};
