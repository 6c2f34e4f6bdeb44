//! Unit tests for rootcause modules
//!
//! These tests exercise the public API of each stage without network I/O.

mod test_config;
mod test_decision;
mod test_error_paths;
mod test_log_analysis;
mod test_reasoning;
