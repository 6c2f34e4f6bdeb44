use std::path::PathBuf;
use thiserror::Error;

/// The central error type for the analyzer.
///
/// Recoverable failures (an unreachable reasoning service, a malformed
/// reply) never surface here; the proposer absorbs them and falls back to
/// rules. What remains are problems with the caller's input or setup.
#[derive(Error, Debug)]
pub enum RcaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No API key configured")]
    MissingCredentials,

    #[error("API request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("API returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Log batch is empty")]
    EmptyBatch,

    #[error("Log entry {index} has no message")]
    MissingMessage { index: usize },

    #[error("Metric {field} out of range: {value}")]
    MetricOutOfRange { field: String, value: f64 },

    #[error("Invalid JSON input: {0}")]
    InvalidJson(String),

    #[error("No log lines found in {path}")]
    NoLogsFound { path: String },
}

pub type Result<T> = std::result::Result<T, RcaError>;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_INPUT_ERROR: u8 = 3;
pub const EXIT_API_ERROR: u8 = 4;

/// Determine the appropriate process exit code for an error.
pub fn get_exit_code(e: &anyhow::Error) -> u8 {
    if let Some(rca_err) = e.downcast_ref::<RcaError>() {
        return match rca_err {
            RcaError::Config(_) => EXIT_CONFIG_ERROR,
            RcaError::Input(_) | RcaError::Io { .. } => EXIT_INPUT_ERROR,
            RcaError::Api(_) => EXIT_API_ERROR,
            RcaError::Other(inner) => get_exit_code(inner),
        };
    }

    // Direct enum unwraps fallback
    if e.downcast_ref::<InputError>().is_some() {
        return EXIT_INPUT_ERROR;
    }
    if e.downcast_ref::<ApiError>().is_some() {
        return EXIT_API_ERROR;
    }

    // Config loading reports through anyhow context strings
    let msg = e.to_string().to_lowercase();
    if msg.contains("config") {
        return EXIT_CONFIG_ERROR;
    }

    EXIT_ERROR
}
