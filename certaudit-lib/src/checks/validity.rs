//! Validity window and lifetime checks.

use super::{CERTIFICATE_LIFETIME, SECONDS_PER_DAY, VALIDITY_DATES};
use crate::fields::CertificateNode;
use crate::results::ValidationRun;

/// Certificates expiring within this many days get a WARNING.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// CA/Browser Forum baseline maximum lifetime for TLS server certificates.
pub const MAX_LIFETIME_DAYS: i64 = 825;

/// Record `validity-dates` and `certificate-lifetime` for `cert` at the run's instant.
///
/// Both records are always produced.
pub fn check_validity(cert: &CertificateNode, run: &mut ValidationRun) {
    let now = run.now();
    let not_before = &cert.not_before;
    let not_after = &cert.not_after;

    if now < not_before.timestamp {
        run.failed(
            VALIDITY_DATES,
            format!("Certificate is not yet valid (valid from {})", not_before),
        );
    } else if now > not_after.timestamp {
        run.failed(
            VALIDITY_DATES,
            format!("Certificate expired on {}", not_after),
        );
    } else {
        let days_left = (not_after.timestamp - now) / SECONDS_PER_DAY;
        if days_left <= EXPIRY_WARNING_DAYS {
            run.warning(
                VALIDITY_DATES,
                format!("Certificate expires in {} days (on {})", days_left, not_after),
            );
        } else {
            run.passed(
                VALIDITY_DATES,
                format!(
                    "Certificate is valid for {} more days (until {})",
                    days_left, not_after
                ),
            );
        }
    }

    let lifetime_days = (not_after.timestamp - not_before.timestamp).div_euclid(SECONDS_PER_DAY);
    if lifetime_days > MAX_LIFETIME_DAYS {
        run.warning(
            CERTIFICATE_LIFETIME,
            format!(
                "Certificate lifetime of {} days exceeds the {}-day CA/Browser Forum limit",
                lifetime_days, MAX_LIFETIME_DAYS
            ),
        );
    } else {
        run.passed(
            CERTIFICATE_LIFETIME,
            format!(
                "Certificate lifetime of {} days is within the {}-day limit",
                lifetime_days, MAX_LIFETIME_DAYS
            ),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::chain::tests::node;
    use crate::fields::DateTime;
    use crate::results::TestStatus;

    const DAY: i64 = SECONDS_PER_DAY;
    const START: i64 = 1_767_225_600; // 2026-01-01T00:00:00Z

    fn cert(lifetime_days: i64) -> CertificateNode {
        let mut c = node("example.com", "ca", "a");
        c.not_before = DateTime::from_timestamp(START);
        c.not_after = DateTime::from_timestamp(START + lifetime_days * DAY);
        c
    }

    fn run_at(c: &CertificateNode, now: i64) -> ValidationRun {
        let mut run = ValidationRun::new("example.com", now);
        check_validity(c, &mut run);
        run
    }

    #[test]
    fn always_two_records() {
        for now in [START - DAY, START + DAY, START + 400 * DAY] {
            let run = run_at(&cert(90), now);
            assert_eq!(run.results().len(), 2);
            assert_eq!(run.results()[0].test, VALIDITY_DATES);
            assert_eq!(run.results()[1].test, CERTIFICATE_LIFETIME);
        }
    }

    #[test]
    fn not_yet_valid_fails() {
        let run = run_at(&cert(90), START - 1);
        assert_eq!(run.results()[0].status, TestStatus::Failed);
        assert!(run.results()[0].message.contains("not yet valid"));
    }

    #[test]
    fn expired_yesterday_cites_expiry_instant() {
        let c = cert(90);
        let run = run_at(&c, c.not_after.timestamp + DAY);
        let result = &run.results()[0];
        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.message.contains("2026-04-01T00:00:00Z"));
    }

    #[test]
    fn near_expiry_warns_with_floored_days() {
        let c = cert(90);
        let run = run_at(&c, c.not_after.timestamp - 30 * DAY - 3600);
        assert_eq!(run.results()[0].status, TestStatus::Warning);
        assert!(run.results()[0].message.contains("expires in 30 days"));
    }

    #[test]
    fn comfortable_window_passes() {
        let c = cert(90);
        let run = run_at(&c, c.not_after.timestamp - 31 * DAY);
        assert_eq!(run.results()[0].status, TestStatus::Passed);
        assert!(run.results()[0].message.contains("valid for 31 more days"));
    }

    #[test]
    fn boundary_instants_are_inside_the_window() {
        let c = cert(90);
        assert_eq!(run_at(&c, START).results()[0].status, TestStatus::Passed);
        let at_end = run_at(&c, c.not_after.timestamp);
        assert_eq!(at_end.results()[0].status, TestStatus::Warning);
        assert!(at_end.results()[0].message.contains("expires in 0 days"));
    }

    #[test]
    fn long_lifetime_warns() {
        assert_eq!(
            run_at(&cert(826), START).results()[1].status,
            TestStatus::Warning
        );
        assert_eq!(
            run_at(&cert(825), START).results()[1].status,
            TestStatus::Passed
        );
    }

    #[test]
    fn repeated_checks_agree() {
        let c = cert(200);
        let first = run_at(&c, START + 10 * DAY);
        let second = run_at(&c, START + 10 * DAY);
        assert_eq!(first.results(), second.results());
    }
}
