//! Authorization verdict from the TLS library.
//!
//! The handshake in [`crate::fetch_chain`] accepts any certificate so that
//! broken chains can still be inspected. The verdict a verifying client
//! would have reached is computed here with rustls' WebPKI verifier: the
//! chain must lead to a trust anchor at the validation instant and the
//! leaf must be valid for the hostname.

use rustls::client::{verify_server_cert_signed_by_trust_anchor, verify_server_name};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use serde::Serialize;
use std::time::Duration;

/// Whether the served chain would be accepted by a verifying TLS client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustVerdict {
    pub authorized: bool,
    /// Why authorization failed, when the verifier said so.
    pub error: Option<String>,
}

impl TrustVerdict {
    pub fn authorized() -> Self {
        TrustVerdict {
            authorized: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        TrustVerdict {
            authorized: false,
            error: Some(error.into()),
        }
    }
}

/// Verify `chain_der` (leaf first) against `roots` for `hostname` at Unix time `now`.
pub fn authorize(
    chain_der: &[Vec<u8>],
    roots: &rustls::RootCertStore,
    hostname: &str,
    now: i64,
) -> TrustVerdict {
    let Some((leaf_der, rest)) = chain_der.split_first() else {
        return TrustVerdict::rejected("empty certificate chain");
    };

    let leaf = CertificateDer::from(leaf_der.as_slice());
    let intermediates: Vec<CertificateDer<'_>> = rest
        .iter()
        .map(|der| CertificateDer::from(der.as_slice()))
        .collect();

    let parsed = match ParsedCertificate::try_from(&leaf) {
        Ok(parsed) => parsed,
        Err(e) => return TrustVerdict::rejected(e.to_string()),
    };

    let provider = rustls::crypto::ring::default_provider();
    let at = UnixTime::since_unix_epoch(Duration::from_secs(now.max(0) as u64));

    if let Err(e) = verify_server_cert_signed_by_trust_anchor(
        &parsed,
        roots,
        &intermediates,
        at,
        provider.signature_verification_algorithms.all,
    ) {
        return TrustVerdict::rejected(e.to_string());
    }

    let server_name = match ServerName::try_from(hostname) {
        Ok(name) => name,
        Err(e) => return TrustVerdict::rejected(format!("invalid server name {}: {}", hostname, e)),
    };
    if let Err(e) = verify_server_name(&parsed, &server_name) {
        return TrustVerdict::rejected(e.to_string());
    }

    TrustVerdict::authorized()
}
