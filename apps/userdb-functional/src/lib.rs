//! Functional test harness for the user database HTTP API.
//!
//! Drives a running server through its public endpoints with tables of
//! `(data, expected)` cases per resource and reports which cases pass.

pub mod connector;
pub mod env_file;
pub mod error;
pub mod fixtures;
pub mod report;
pub mod suites;

pub use connector::{get_response, Expected, HttpConnector, HttpResponse};
pub use error::HarnessError;
pub use report::SuiteReport;
