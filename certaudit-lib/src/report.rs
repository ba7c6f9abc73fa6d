//! Console and JSON rendering of validation results.
//!
//! Everything here is a projection: rendering never changes the results.

use crate::chain::{CertificateChain, MAX_CHAIN_HOPS};
use crate::fields::CertificateNode;
use crate::results::{TestStatus, ValidationSummary, ValidationTestResult};
use crate::util;
use crate::CertAuditError;
use serde::Serialize;
use std::path::Path;

/// The JSON document written by `--output` and printed by `--json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub timestamp: String,
    pub tests: Vec<ValidationTestResult>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Build a report over `tests`, stamped with Unix time `now`.
    pub fn new(tests: Vec<ValidationTestResult>, now: i64) -> Self {
        let summary = ValidationSummary::from_results(&tests);
        ValidationReport {
            timestamp: util::format_iso8601(now),
            tests,
            summary,
        }
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, CertAuditError> {
        serde_json::to_string_pretty(self).map_err(CertAuditError::Json)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), CertAuditError> {
        let mut json = self.to_json()?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// One line per result: status symbol, test name and message.
pub fn render_results(results: &[ValidationTestResult]) -> String {
    let mut out = String::new();
    for result in results {
        out.push_str(&format!(
            "{} {}: {}\n",
            result.status.symbol(),
            result.test,
            result.message
        ));
    }
    out
}

pub fn render_summary(summary: &ValidationSummary) -> String {
    format!(
        "Summary: {} tests, {} passed, {} warnings, {} failed\n",
        summary.total, summary.passed, summary.warnings, summary.failed
    )
}

/// Closing sentence for a run.
pub fn render_verdict(summary: &ValidationSummary) -> String {
    if summary.failed > 0 {
        format!(
            "{} SSL certificate validation failed with {} error(s)\n",
            TestStatus::Failed.symbol(),
            summary.failed
        )
    } else if summary.warnings > 0 {
        format!(
            "{} SSL certificate is valid with {} warning(s)\n",
            TestStatus::Warning.symbol(),
            summary.warnings
        )
    } else {
        format!(
            "{} SSL certificate validation passed\n",
            TestStatus::Passed.symbol()
        )
    }
}

/// Details of one certificate, printed with `--verbose`.
pub fn render_certificate(cert: &CertificateNode) -> String {
    let mut out = String::new();

    out.push_str("Certificate:\n");
    out.push_str(&format!("  Subject: {}\n", cert.subject));
    out.push_str(&format!("  Issuer: {}\n", cert.issuer));
    out.push_str("  Validity:\n");
    out.push_str(&format!("    Not Before: {}\n", cert.not_before));
    out.push_str(&format!("    Not After:  {}\n", cert.not_after));
    out.push_str(&format!("  Signature Algorithm: {}\n", cert.signature_algorithm));

    if !cert.subject_alt_names.is_empty() {
        out.push_str("  Subject Alternative Name:\n");
        for name in &cert.subject_alt_names {
            out.push_str(&format!("    DNS: {}\n", name));
        }
    }
    if !cert.extended_key_usage.is_empty() {
        out.push_str(&format!(
            "  Extended Key Usage: {}\n",
            cert.extended_key_usage.join(", ")
        ));
    }

    out.push_str(&format!("  Fingerprint (SHA-256): {}\n", cert.fingerprint));
    out
}

/// Subject and issuer of each certificate from the leaf up, following issuer links.
pub fn render_chain(chain: &CertificateChain) -> String {
    let mut out = String::new();
    let mut current = 0;
    for depth in 0..=MAX_CHAIN_HOPS {
        let Some(node) = chain.node(current) else {
            break;
        };
        out.push_str(&format!(
            "depth {}: subject = {}, issuer = {}\n",
            depth,
            node.subject.to_oneline(),
            node.issuer.to_oneline()
        ));
        match chain.issuer_of(current) {
            Some(next) if next != current && next != 0 => current = next,
            _ => break,
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::chain::tests::linear_chain;
    use crate::results::ValidationRun;

    fn sample() -> ValidationRun {
        let mut run = ValidationRun::new("example.com", 1_767_225_600);
        run.passed("validity-dates", "Certificate is valid for 90 more days");
        run.warning("key-usage", "no serverAuth");
        run.failed("ca-trust", "Certificate is not trusted: UnknownIssuer");
        run
    }

    #[test]
    fn results_are_prefixed_with_symbols() {
        let text = render_results(sample().results());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.first().unwrap().starts_with("✅ validity-dates:"));
        assert!(lines.get(1).unwrap().starts_with("⚠️ key-usage:"));
        assert!(lines.get(2).unwrap().starts_with("❌ ca-trust:"));
    }

    #[test]
    fn summary_and_verdict() {
        let summary = sample().summary();
        assert_eq!(
            render_summary(&summary),
            "Summary: 3 tests, 1 passed, 1 warnings, 1 failed\n"
        );
        assert!(render_verdict(&summary).contains("failed with 1 error(s)"));

        let clean = ValidationSummary {
            total: 2,
            passed: 2,
            ..ValidationSummary::default()
        };
        assert!(render_verdict(&clean).contains("validation passed"));

        let warned = ValidationSummary {
            total: 2,
            passed: 1,
            warnings: 1,
            failed: 0,
        };
        assert!(render_verdict(&warned).contains("1 warning(s)"));
    }

    #[test]
    fn report_json_shape() {
        let run = sample();
        let report = ValidationReport::new(run.into_results(), 1_767_225_600);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["timestamp"], "2026-01-01T00:00:00Z");
        assert_eq!(value["summary"]["total"], 3);
        assert_eq!(value["summary"]["warnings"], 1);
        assert_eq!(value["tests"][2]["status"], "FAILED");
        assert_eq!(value["tests"][0]["hostname"], "example.com");
        assert_eq!(value["tests"][0]["timestamp"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn rendering_leaves_results_untouched() {
        let run = sample();
        let before = run.results().to_vec();
        let _ = render_results(run.results());
        let _ = render_summary(&run.summary());
        assert_eq!(run.results(), before.as_slice());
    }

    #[test]
    fn certificate_details() {
        let mut cert = crate::chain::tests::node("example.com", "Test CA", "AB:CD");
        cert.subject_alt_names = vec!["example.com".into(), "*.example.com".into()];
        let text = render_certificate(&cert);
        assert!(text.contains("  Subject: CN = example.com\n"));
        assert!(text.contains("  Issuer: CN = Test CA\n"));
        assert!(text.contains("    DNS: *.example.com\n"));
        assert!(text.contains("Not After:  1971-01-01T00:00:00Z"));
        assert!(text.contains("Fingerprint (SHA-256): AB:CD"));
        assert!(!text.contains("Extended Key Usage"));
    }

    #[test]
    fn chain_is_rendered_leaf_first() {
        let text = render_chain(&linear_chain(3));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.first().unwrap().starts_with("depth 0: subject = CN = cert0"));
        assert!(lines.get(2).unwrap().contains("issuer = CN = cert2"));
    }

    #[test]
    fn write_to_file() {
        let dir = std::env::temp_dir().join(format!("certaudit-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");
        ValidationReport::new(sample().into_results(), 0)
            .write_to(&path)
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"tests\""));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
