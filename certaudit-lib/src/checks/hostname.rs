//! Hostname matching against the leaf certificate's CN and SANs.

use super::SUBJECT_SAN_MATCH;
use crate::fields::CertificateNode;
use crate::results::ValidationRun;

/// Whether a certificate name matches `hostname`.
///
/// Plain names must be byte-for-byte equal (case-sensitive). A name of the
/// form `*.<domain>` matches exactly one extra leftmost label:
/// `*.example.com` matches `www.example.com` but neither `example.com` nor
/// `a.b.example.com`. Empty names never match.
pub fn matches(cert_name: &str, hostname: &str) -> bool {
    if cert_name.is_empty() {
        return false;
    }
    if cert_name == hostname {
        return true;
    }
    let Some(domain) = cert_name.strip_prefix("*.") else {
        return false;
    };
    match hostname.split_once('.') {
        Some((_, rest)) => rest == domain,
        None => false,
    }
}

/// Record `subject-san-match` for the leaf.
///
/// The subject CN is tried first, then each SAN entry in order; the first
/// matching name is cited in the result.
pub fn check_hostname(leaf: &CertificateNode, run: &mut ValidationRun) {
    let hostname = run.hostname().to_string();

    if let Some(cn) = leaf.common_name().filter(|cn| matches(cn, &hostname)) {
        run.passed(
            SUBJECT_SAN_MATCH,
            format!("Hostname {} matches certificate CN: {}", hostname, cn),
        );
        return;
    }

    if let Some(san) = leaf
        .subject_alt_names
        .iter()
        .find(|san| matches(san, &hostname))
    {
        run.passed(
            SUBJECT_SAN_MATCH,
            format!("Hostname {} matches SAN entry: {}", hostname, san),
        );
        return;
    }

    let sans = if leaf.subject_alt_names.is_empty() {
        "none".to_string()
    } else {
        leaf.subject_alt_names.join(", ")
    };
    run.failed(
        SUBJECT_SAN_MATCH,
        format!(
            "Hostname {} does not match certificate CN ({}) or SANs ({})",
            hostname,
            leaf.common_name().unwrap_or("none"),
            sans
        ),
    );
}
