//! Issuer linking for served certificate chains.
//!
//! A [`CertificateChain`] is an arena of [`CertificateNode`]s where each node
//! carries an optional index of its issuer. The leaf is always index 0. A node
//! whose issuer index is itself is a self-signed root; a node without an
//! issuer index ends an incomplete chain. Links may form cycles, so every
//! walker over a chain is bounded.

use crate::fields::CertificateNode;
use crate::trust_store::TrustStore;
use std::collections::HashSet;
use x509_parser::prelude::*;

/// Maximum number of issuer links followed before a chain is considered too long.
pub const MAX_CHAIN_HOPS: usize = 10;

/// Certificates of one validation run plus their issuer links.
#[derive(Debug, Clone, Default)]
pub struct CertificateChain {
    nodes: Vec<CertificateNode>,
    issuers: Vec<Option<usize>>,
}

impl CertificateChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unlinked node and return its index.
    pub fn push(&mut self, node: CertificateNode) -> usize {
        self.nodes.push(node);
        self.issuers.push(None);
        self.nodes.len() - 1
    }

    /// Set `issuer` as the issuer of `child`. Out-of-range indices are ignored.
    pub fn link(&mut self, child: usize, issuer: usize) {
        if issuer >= self.nodes.len() {
            return;
        }
        if let Some(slot) = self.issuers.get_mut(child) {
            *slot = Some(issuer);
        }
    }

    pub fn node(&self, index: usize) -> Option<&CertificateNode> {
        self.nodes.get(index)
    }

    pub fn leaf(&self) -> Option<&CertificateNode> {
        self.nodes.first()
    }

    pub fn issuer_of(&self, index: usize) -> Option<usize> {
        self.issuers.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in arena order (served order, then appended trust anchors).
    pub fn nodes(&self) -> &[CertificateNode] {
        &self.nodes
    }

    fn position_by_fingerprint(&self, fingerprint: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.fingerprint == fingerprint)
    }
}

/// Link served certificates (leaf first) to their issuers.
///
/// For each served certificate the issuer is, in order of preference:
/// 1. itself, when self-issued;
/// 2. another served certificate whose subject equals its issuer name and
///    whose key verifies its signature, else the first one with a matching name;
/// 3. a trust-store certificate with a matching subject, appended to the arena.
///
/// Anything else leaves the issuer link empty.
pub fn link_chain(served: Vec<CertificateNode>, trust_store: &TrustStore) -> CertificateChain {
    let mut chain = CertificateChain::new();
    for node in served {
        chain.push(node);
    }

    let served_len = chain.len();
    for child in 0..served_len {
        let Some(node) = chain.node(child) else {
            continue;
        };
        if node.is_self_issued() {
            chain.link(child, child);
            continue;
        }

        if let Some(issuer) = find_served_issuer(&chain, child, served_len) {
            chain.link(child, issuer);
            continue;
        }

        if let Some(anchor) = find_trusted_issuer(node, trust_store) {
            let index = match chain.position_by_fingerprint(&anchor.fingerprint) {
                Some(existing) => existing,
                None => {
                    let self_issued = anchor.is_self_issued();
                    let index = chain.push(anchor);
                    if self_issued {
                        chain.link(index, index);
                    }
                    index
                }
            };
            chain.link(child, index);
        }
    }

    tracing::debug!(nodes = chain.len(), served = served_len, "linked certificate chain");
    chain
}

fn find_served_issuer(chain: &CertificateChain, child: usize, served_len: usize) -> Option<usize> {
    let node = chain.node(child)?;
    let candidates: Vec<usize> = (0..served_len)
        .filter(|&i| i != child)
        .filter(|&i| {
            chain
                .node(i)
                .is_some_and(|c| c.raw_subject == node.raw_issuer)
        })
        .collect();

    candidates
        .iter()
        .copied()
        .find(|&i| {
            chain
                .node(i)
                .is_some_and(|issuer| signed_by(&node.raw_der, &issuer.raw_der))
        })
        .or_else(|| candidates.first().copied())
}

fn find_trusted_issuer(node: &CertificateNode, trust_store: &TrustStore) -> Option<CertificateNode> {
    let candidates = trust_store.find_by_subject_raw(&node.raw_issuer);
    let chosen = candidates
        .iter()
        .find(|der| signed_by(&node.raw_der, der))
        .or_else(|| candidates.first())?;
    crate::parser::parse_der(chosen).ok()
}

/// Whether `issuer_der`'s public key verifies `child_der`'s signature.
fn signed_by(child_der: &[u8], issuer_der: &[u8]) -> bool {
    let (Ok((_, child)), Ok((_, issuer))) = (
        X509Certificate::from_der(child_der),
        X509Certificate::from_der(issuer_der),
    ) else {
        return false;
    };
    child.verify_signature(Some(issuer.public_key())).is_ok()
}

/// Find the root by following issuer links from the leaf.
///
/// Stops at a missing link or a self link. Returns `None` for an empty chain
/// or when the walk revisits a fingerprint or exceeds [`MAX_CHAIN_HOPS`].
pub fn find_root(chain: &CertificateChain) -> Option<usize> {
    chain.leaf()?;
    let mut seen = HashSet::new();
    let mut current = 0;
    for _ in 0..=MAX_CHAIN_HOPS {
        let node = chain.node(current)?;
        if !seen.insert(node.fingerprint.as_str()) {
            return None;
        }
        match chain.issuer_of(current) {
            Some(next) if next != current => current = next,
            _ => return Some(current),
        }
    }
    None
}
