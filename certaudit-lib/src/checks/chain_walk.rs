//! Issuer-link walk from the leaf: cycle detection and chain length.

use super::signature::audit_signatures;
use super::CERTIFICATE_CHAIN;
use crate::chain::{CertificateChain, MAX_CHAIN_HOPS};
use crate::results::{TestStatus, ValidationRun};
use std::collections::HashSet;

/// How a walk from the leaf ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainWalk {
    /// The leaf has no issuer link, or links to itself.
    Incomplete,
    /// A fingerprint was reached twice.
    Circular,
    /// More than [`MAX_CHAIN_HOPS`] links were followed.
    TooLong,
    /// The walk reached a root or a missing link after `hops` links.
    Complete { hops: usize },
}

/// Classify a cleanly terminated walk by its number of issuer links.
pub fn classify_hops(hops: usize) -> (TestStatus, String) {
    match hops {
        2..=4 => (
            TestStatus::Passed,
            format!("Certificate chain has appropriate length ({} links)", hops),
        ),
        1 => (
            TestStatus::Warning,
            "Certificate chain is very short (1 link), may be missing intermediates".to_string(),
        ),
        n => (
            TestStatus::Warning,
            format!("Certificate chain has unusual length ({} links)", n),
        ),
    }
}

/// Walk issuer links from the leaf and record `certificate-chain`.
///
/// A cycle or an overlong chain fails immediately. A leaf without a usable
/// issuer gets a WARNING. Only a walk that terminates cleanly is classified
/// by length and followed by the signature audit.
pub fn walk_chain(chain: &CertificateChain, run: &mut ValidationRun) -> ChainWalk {
    let outcome = walk(chain);
    match outcome {
        ChainWalk::Incomplete => run.warning(
            CERTIFICATE_CHAIN,
            "Certificate chain is incomplete or self-signed",
        ),
        ChainWalk::Circular => run.failed(
            CERTIFICATE_CHAIN,
            "Circular reference detected in certificate chain",
        ),
        ChainWalk::TooLong => run.failed(
            CERTIFICATE_CHAIN,
            format!(
                "Certificate chain too long (more than {} links)",
                MAX_CHAIN_HOPS
            ),
        ),
        ChainWalk::Complete { hops } => {
            let (status, message) = classify_hops(hops);
            run.record(CERTIFICATE_CHAIN, status, message);
            audit_signatures(chain, run);
        }
    }
    outcome
}

fn walk(chain: &CertificateChain) -> ChainWalk {
    let Some(leaf) = chain.leaf() else {
        return ChainWalk::Incomplete;
    };
    match chain.issuer_of(0) {
        None | Some(0) => return ChainWalk::Incomplete,
        Some(_) => {}
    }

    let mut visited = HashSet::from([leaf.fingerprint.as_str()]);
    let mut current = 0;
    let mut hops = 0;

    while let Some(next) = chain.issuer_of(current).filter(|&i| i != current) {
        let Some(node) = chain.node(next) else {
            break;
        };
        if !visited.insert(node.fingerprint.as_str()) {
            return ChainWalk::Circular;
        }
        hops += 1;
        if hops > MAX_CHAIN_HOPS {
            return ChainWalk::TooLong;
        }
        current = next;
    }

    ChainWalk::Complete { hops }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::chain::tests::{linear_chain, node};
    use crate::checks::SIGNATURE_ALGORITHMS;

    fn walked(chain: &CertificateChain) -> (ChainWalk, ValidationRun) {
        let mut run = ValidationRun::new("example.com", 0);
        let outcome = walk_chain(chain, &mut run);
        (outcome, run)
    }

    #[test]
    fn three_certificates_pass() {
        let (outcome, run) = walked(&linear_chain(3));
        assert_eq!(outcome, ChainWalk::Complete { hops: 2 });
        let result = run.find(CERTIFICATE_CHAIN).unwrap();
        assert_eq!(result.status, TestStatus::Passed);
        assert!(result.message.contains("appropriate length"));
        assert!(run.find(SIGNATURE_ALGORITHMS).is_some());
    }

    #[test]
    fn leaf_signed_by_root_is_very_short() {
        let (outcome, run) = walked(&linear_chain(2));
        assert_eq!(outcome, ChainWalk::Complete { hops: 1 });
        let result = run.find(CERTIFICATE_CHAIN).unwrap();
        assert_eq!(result.status, TestStatus::Warning);
        assert!(result.message.contains("very short"));
    }

    #[test]
    fn ten_links_is_unusual_but_allowed() {
        let (outcome, run) = walked(&linear_chain(11));
        assert_eq!(outcome, ChainWalk::Complete { hops: 10 });
        assert!(run
            .find(CERTIFICATE_CHAIN)
            .unwrap()
            .message
            .contains("unusual length"));
    }

    #[test]
    fn twelve_certificates_are_too_long() {
        let (outcome, run) = walked(&linear_chain(12));
        assert_eq!(outcome, ChainWalk::TooLong);
        let result = run.find(CERTIFICATE_CHAIN).unwrap();
        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.message.contains("too long"));
        assert!(run.find(SIGNATURE_ALGORITHMS).is_none());
    }

    #[test]
    fn two_node_cycle_terminates() {
        let mut chain = CertificateChain::new();
        chain.push(node("a", "b", "fa"));
        chain.push(node("b", "a", "fb"));
        chain.link(0, 1);
        chain.link(1, 0);

        let (outcome, run) = walked(&chain);
        assert_eq!(outcome, ChainWalk::Circular);
        let result = run.find(CERTIFICATE_CHAIN).unwrap();
        assert_eq!(result.status, TestStatus::Failed);
        assert!(result.message.contains("Circular reference"));
        assert_eq!(run.results().len(), 1);
    }

    #[test]
    fn repeated_fingerprint_on_distinct_nodes_is_a_cycle() {
        let mut chain = CertificateChain::new();
        chain.push(node("leaf", "int", "leaf-fp"));
        chain.push(node("int", "int2", "int-fp"));
        chain.push(node("int2", "x", "int-fp"));
        chain.link(0, 1);
        chain.link(1, 2);
        assert_eq!(walked(&chain).0, ChainWalk::Circular);
    }

    #[test]
    fn self_signed_leaf_skips_audit() {
        let mut chain = CertificateChain::new();
        chain.push(node("leaf", "leaf", "a"));
        chain.link(0, 0);
        let (outcome, run) = walked(&chain);
        assert_eq!(outcome, ChainWalk::Incomplete);
        assert_eq!(run.results().len(), 1);
        assert_eq!(run.results()[0].status, TestStatus::Warning);
        assert!(run.results()[0].message.contains("incomplete or self-signed"));
    }

    #[test]
    fn unlinked_leaf_is_incomplete() {
        let mut chain = CertificateChain::new();
        chain.push(node("leaf", "ca", "a"));
        assert_eq!(walked(&chain).0, ChainWalk::Incomplete);
    }

    #[test]
    fn missing_link_after_intermediate_completes() {
        let mut chain = CertificateChain::new();
        chain.push(node("leaf", "int", "a"));
        chain.push(node("int", "gone", "b"));
        chain.link(0, 1);
        assert_eq!(walked(&chain).0, ChainWalk::Complete { hops: 1 });
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify_hops(0).0, TestStatus::Warning);
        assert_eq!(classify_hops(1).0, TestStatus::Warning);
        for hops in 2..=4 {
            assert_eq!(classify_hops(hops).0, TestStatus::Passed);
        }
        assert_eq!(classify_hops(5).0, TestStatus::Warning);
    }
}
