//! Per-suite pass/fail bookkeeping.

use std::fmt;

use crate::error::HarnessError;

/// One failed case with the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseFailure {
    pub case: String,
    pub reason: String,
}

/// Result of running one suite.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub suite: String,
    pub passed: Vec<String>,
    pub failed: Vec<CaseFailure>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            ..Default::default()
        }
    }

    /// Records the outcome of case `case` of test `test`.
    pub fn record(&mut self, test: &str, case: &str, outcome: Result<(), HarnessError>) {
        let name = format!("{}[{}]", test, case);
        match outcome {
            Ok(()) => {
                tracing::debug!("PASS {}::{}", self.suite, name);
                self.passed.push(name);
            }
            Err(err) => {
                tracing::warn!("FAIL {}::{}: {}", self.suite, name, err);
                self.failed.push(CaseFailure {
                    case: name,
                    reason: err.to_string(),
                });
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} passed, {} failed",
            self.suite,
            self.passed.len(),
            self.failed.len()
        )?;
        for failure in &self.failed {
            writeln!(f, "  FAILED {}: {}", failure.case, failure.reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_display() {
        let mut report = SuiteReport::new("users");
        report.record("create_user", "No existing email", Ok(()));
        report.record(
            "create_user",
            "Existing email",
            Err(HarnessError::UnexpectedError("boom".to_string())),
        );

        assert!(!report.is_success());
        assert_eq!(report.total(), 2);
        assert_eq!(report.passed, vec!["create_user[No existing email]"]);

        let text = report.to_string();
        assert!(text.starts_with("users: 1 passed, 1 failed"));
        assert!(text.contains("FAILED create_user[Existing email]: Failed to run test. Returned: boom"));
    }
}
