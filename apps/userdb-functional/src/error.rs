//! Harness error types.

use thiserror::Error;

/// Reasons a case, or the whole run, fails.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Server never answered the readiness probe
    #[error("Cannot connect to test server at {url} after {attempts} attempts")]
    Unreachable { url: String, attempts: u32 },

    /// Transport-level failure
    #[error("Failed to send request to {path}: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body is not a valid envelope
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Server returned an error the case did not expect
    #[error("Failed to run test. Returned: {0}")]
    UnexpectedError(String),

    /// Server answered, but not with what the case expects
    #[error("Test failed. {0}")]
    Mismatch(String),

    /// Case table lacks a field the fixture needs
    #[error("Missing {0} test data")]
    MissingTestData(&'static str),

    /// Env file could not be read or lacks a key
    #[error("Invalid env file {path}: {message}")]
    EnvFile { path: String, message: String },
}

impl HarnessError {
    /// Builds a mismatch error showing both sides.
    pub fn mismatch(returned: impl std::fmt::Display, expected: impl std::fmt::Display) -> Self {
        HarnessError::Mismatch(format!("Returned: {} Expected: {}", returned, expected))
    }
}
