//! Weak signature algorithm audit along the chain.

use super::SIGNATURE_ALGORITHMS;
use crate::chain::{CertificateChain, MAX_CHAIN_HOPS};
use crate::results::ValidationRun;

/// Digest names that make a signature algorithm weak.
const WEAK_DIGESTS: &[&str] = &["md5", "sha1"];

/// Whether an algorithm name contains a weak digest (case-insensitive).
pub fn is_weak_algorithm(algorithm: &str) -> bool {
    let lower = algorithm.to_ascii_lowercase();
    WEAK_DIGESTS.iter().any(|weak| lower.contains(weak))
}

/// Record `signature-algorithms` for up to [`MAX_CHAIN_HOPS`] certificates
/// starting at the leaf.
///
/// The audit stops at a missing issuer link, a self link, or a link back to
/// the leaf. Every weak certificate is listed by depth (leaf = 0).
pub fn audit_signatures(chain: &CertificateChain, run: &mut ValidationRun) {
    let mut weak = Vec::new();
    let mut current = 0;

    for depth in 0..MAX_CHAIN_HOPS {
        let Some(node) = chain.node(current) else {
            break;
        };
        if is_weak_algorithm(&node.signature_algorithm) {
            weak.push(format!(
                "certificate at depth {} ({}) uses {}",
                depth,
                node.short_name(),
                node.signature_algorithm
            ));
        }
        match chain.issuer_of(current) {
            Some(next) if next != current && next != 0 => current = next,
            _ => break,
        }
    }

    if weak.is_empty() {
        run.passed(
            SIGNATURE_ALGORITHMS,
            "No weak signature algorithms in the certificate chain",
        );
    } else {
        run.failed(
            SIGNATURE_ALGORITHMS,
            format!("Weak signature algorithms found: {}", weak.join("; ")),
        );
    }
}
