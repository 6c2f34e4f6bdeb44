//! Testing support
//!
//! A local mock of the external reasoning service, shared by unit tests,
//! integration tests and benchmarks.

pub mod mock_api;
