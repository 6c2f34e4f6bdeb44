//! Error path and edge case tests
//!
//! These tests focus on the outer surfaces that can fail:
//! - Missing or empty input files
//! - Malformed JSON batches
//! - Exit code mapping

use rootcause::errors::{
    get_exit_code, ApiError, InputError, RcaError, EXIT_API_ERROR, EXIT_CONFIG_ERROR,
    EXIT_ERROR, EXIT_INPUT_ERROR,
};
use rootcause::ingest::{parse_batch, read_batch, read_lines};
use std::fs;
use tempfile::tempdir;

// ============================================================================
// Ingest Error Tests
// ============================================================================

mod ingest_error_tests {
    use super::*;

    #[test]
    fn test_missing_log_file_maps_to_input_exit() {
        let err = read_lines("/no/such/file.log", None).unwrap_err();
        let err: anyhow::Error = err.into();
        assert_eq!(get_exit_code(&err), EXIT_INPUT_ERROR);
    }

    #[test]
    fn test_blank_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.log");
        fs::write(&path, "\n\n  \n").unwrap();
        let err = read_lines(path.to_str().unwrap(), Some(10)).unwrap_err();
        assert!(err.to_string().contains("No log lines found"));
    }

    #[test]
    fn test_batch_with_wrong_types() {
        let err = parse_batch(r#"{"logs": "not a list"}"#).unwrap_err();
        assert!(matches!(err, RcaError::Input(InputError::InvalidJson(_))));
    }

    #[test]
    fn test_batch_non_numeric_metric() {
        let err = parse_batch(r#"{"logs": [{"message": "x"}], "metrics": {"cpu_usage": "high"}}"#)
            .unwrap_err();
        assert!(matches!(err, RcaError::Input(InputError::InvalidJson(_))));
    }

    #[test]
    fn test_batch_file_round() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(
            &path,
            r#"{"logs": [{"message": "ERROR: a"}, {"message": "ERROR: b"}], "metrics": {"memory_usage": 120}}"#,
        )
        .unwrap();
        let err = read_batch(path.to_str().unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Input error: Metric memory_usage out of range: 120"
        );
    }
}

// ============================================================================
// Exit Code Tests
// ============================================================================

mod exit_code_tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config: anyhow::Error = RcaError::Config("bad".into()).into();
        assert_eq!(get_exit_code(&config), EXIT_CONFIG_ERROR);

        let input: anyhow::Error = InputError::EmptyBatch.into();
        assert_eq!(get_exit_code(&input), EXIT_INPUT_ERROR);

        let api: anyhow::Error = RcaError::Api(ApiError::MissingCredentials).into();
        assert_eq!(get_exit_code(&api), EXIT_API_ERROR);

        let other = anyhow::anyhow!("something odd");
        assert_eq!(get_exit_code(&other), EXIT_ERROR);
    }

    #[test]
    fn test_exit_code_survives_context() {
        let err = anyhow::Error::from(InputError::EmptyBatch).context("while reading batch");
        assert_eq!(get_exit_code(&err), EXIT_INPUT_ERROR);
    }
}
