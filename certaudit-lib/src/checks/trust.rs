//! Trust verdict, root certificate and key usage checks.

use super::{CA_TRUST, KEY_USAGE, ROOT_CERTIFICATE};
use crate::authorize::TrustVerdict;
use crate::chain::{find_root, CertificateChain};
use crate::fields::CertificateNode;
use crate::results::ValidationRun;

/// EKU entries that permit TLS server authentication.
const SERVER_AUTH_USAGES: &[&str] = &["TLS Web Server Authentication", "serverAuth"];

/// Record `ca-trust` from the TLS library's verdict.
pub fn check_authorization(verdict: &TrustVerdict, run: &mut ValidationRun) {
    if verdict.authorized {
        run.passed(CA_TRUST, "Certificate is trusted by system CA store");
    } else {
        run.failed(
            CA_TRUST,
            format!(
                "Certificate is not trusted: {}",
                verdict
                    .error
                    .as_deref()
                    .unwrap_or("Unknown authorization error")
            ),
        );
    }
}

/// Record `root-certificate` for the root reached by following issuer links.
///
/// The root passes when its subject CN equals its issuer CN.
pub fn check_root(chain: &CertificateChain, run: &mut ValidationRun) {
    let Some(root) = find_root(chain).and_then(|i| chain.node(i)) else {
        run.warning(
            ROOT_CERTIFICATE,
            "Could not determine the root certificate of the chain",
        );
        return;
    };

    if root.subject.common_name() == root.issuer.common_name() {
        run.passed(
            ROOT_CERTIFICATE,
            format!(
                "Root certificate is self-signed: {}",
                root.common_name().unwrap_or("(no CN)")
            ),
        );
    } else {
        run.warning(
            ROOT_CERTIFICATE,
            format!(
                "Root certificate does not appear self-signed: {} issued by {}",
                root.common_name().unwrap_or("(no CN)"),
                root.issuer.common_name().unwrap_or("(no CN)")
            ),
        );
    }
}

/// Record `key-usage`: the leaf must allow TLS server authentication.
pub fn check_key_usage(leaf: &CertificateNode, run: &mut ValidationRun) {
    let server_auth = leaf
        .extended_key_usage
        .iter()
        .any(|usage| SERVER_AUTH_USAGES.contains(&usage.as_str()));

    if server_auth {
        run.passed(KEY_USAGE, "Certificate allows TLS server authentication");
    } else if leaf.extended_key_usage.is_empty() {
        run.warning(
            KEY_USAGE,
            "Certificate has no Extended Key Usage for TLS server authentication",
        );
    } else {
        run.warning(
            KEY_USAGE,
            format!(
                "Certificate Extended Key Usage lacks TLS server authentication: {}",
                leaf.extended_key_usage.join(", ")
            ),
        );
    }
}
