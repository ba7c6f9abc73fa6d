//! Check outcomes and their aggregation.

use crate::util;
use serde::Serialize;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Passed,
    Warning,
    Failed,
}

impl TestStatus {
    /// Console prefix for this status.
    pub fn symbol(self) -> &'static str {
        match self {
            TestStatus::Passed => "✅",
            TestStatus::Warning => "⚠️",
            TestStatus::Failed => "❌",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Warning => "WARNING",
            TestStatus::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// One named check outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationTestResult {
    pub test: String,
    pub status: TestStatus,
    pub message: String,
    pub hostname: String,
    /// ISO 8601 instant of the validation run.
    pub timestamp: String,
}

/// Counts derived from a result sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl ValidationSummary {
    pub fn from_results(results: &[ValidationTestResult]) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        ValidationSummary {
            total: results.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            warnings: count(TestStatus::Warning),
        }
    }
}

/// Context for validating one hostname.
///
/// Holds the hostname, the validation instant, and the results recorded so
/// far. Results can only be appended, in execution order.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    hostname: String,
    now: i64,
    timestamp: String,
    results: Vec<ValidationTestResult>,
}

impl ValidationRun {
    /// Start a run for `hostname` evaluated at Unix time `now`.
    pub fn new(hostname: impl Into<String>, now: i64) -> Self {
        ValidationRun {
            hostname: hostname.into(),
            now,
            timestamp: util::format_iso8601(now),
            results: Vec::new(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The instant all time-dependent checks are evaluated at.
    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn record(&mut self, test: &str, status: TestStatus, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(hostname = %self.hostname, test, %status, "{}", message);
        self.results.push(ValidationTestResult {
            test: test.to_string(),
            status,
            message,
            hostname: self.hostname.clone(),
            timestamp: self.timestamp.clone(),
        });
    }

    pub fn passed(&mut self, test: &str, message: impl Into<String>) {
        self.record(test, TestStatus::Passed, message);
    }

    pub fn warning(&mut self, test: &str, message: impl Into<String>) {
        self.record(test, TestStatus::Warning, message);
    }

    pub fn failed(&mut self, test: &str, message: impl Into<String>) {
        self.record(test, TestStatus::Failed, message);
    }

    pub fn results(&self) -> &[ValidationTestResult] {
        &self.results
    }

    /// The first result recorded under `test`, if any.
    pub fn find(&self, test: &str) -> Option<&ValidationTestResult> {
        self.results.iter().find(|r| r.test == test)
    }

    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary::from_results(&self.results)
    }

    pub fn into_results(self) -> Vec<ValidationTestResult> {
        self.results
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_status() {
        let mut run = ValidationRun::new("example.com", 0);
        for i in 0..6 {
            run.passed(&format!("p{}", i), "ok");
        }
        run.warning("w0", "meh");
        run.failed("f0", "bad");
        run.warning("w1", "meh");
        run.failed("f1", "bad");

        assert_eq!(
            run.summary(),
            ValidationSummary {
                total: 10,
                passed: 6,
                failed: 2,
                warnings: 2,
            }
        );
    }

    #[test]
    fn results_keep_execution_order_and_duplicates() {
        let mut run = ValidationRun::new("example.com", 0);
        run.failed("b", "first");
        run.passed("a", "second");
        run.failed("b", "third");
        let names: Vec<_> = run.results().iter().map(|r| r.test.as_str()).collect();
        assert_eq!(names, ["b", "a", "b"]);
        assert_eq!(run.find("b").unwrap().message, "first");
    }

    #[test]
    fn records_carry_hostname_and_run_timestamp() {
        let mut run = ValidationRun::new("example.com", 1_767_225_600);
        run.passed("x", "ok");
        let r = &run.results()[0];
        assert_eq!(r.hostname, "example.com");
        assert_eq!(r.timestamp, "2026-01-01T00:00:00Z");
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&TestStatus::Warning).unwrap(),
            "\"WARNING\""
        );
        assert_eq!(TestStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn empty_summary_is_zero() {
        assert_eq!(
            ValidationSummary::from_results(&[]),
            ValidationSummary::default()
        );
    }
}
