//! certaudit-lib: Library for validating the TLS certificate served by a host.
//!
//! Connects to a TLS endpoint (or reads a PEM chain), rebuilds the issuer
//! links of the served certificates, and runs a fixed sequence of checks:
//! hostname matching, validity window, chain shape, signature algorithms,
//! trust anchoring, root certificate and key usage. Every check produces a
//! [`ValidationTestResult`]; the results are aggregated into a
//! [`ValidationSummary`] and rendered as console text or a JSON report.

mod authorize;
mod chain;
pub mod checks;
mod fetch;
mod fields;
mod fingerprint;
mod oid;
mod parser;
mod report;
mod results;
mod trust_store;
mod util;
mod validate;

pub use authorize::{authorize, TrustVerdict};
pub use chain::{find_root, link_chain, CertificateChain, MAX_CHAIN_HOPS};
pub use fetch::{fetch_chain, ServedChain};
pub use fields::{CertificateNode, DateTime, DistinguishedName};
pub use fingerprint::compute_fingerprint;
pub use parser::{parse_cert, parse_der, parse_pem, parse_pem_chain};
pub use report::{
    render_certificate, render_chain, render_results, render_summary, render_verdict,
    ValidationReport,
};
pub use results::{TestStatus, ValidationRun, ValidationSummary, ValidationTestResult};
pub use trust_store::{find_system_ca_bundle, TrustStore};
pub use validate::{ValidateOptions, Validation, Validator, DEFAULT_PORT, DEFAULT_TIMEOUT};

/// Errors returned by certaudit-lib.
#[derive(Debug, thiserror::Error)]
pub enum CertAuditError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection timed out after {:?}", .0)]
    Timeout(std::time::Duration),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Trust store error: {0}")]
    TrustStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
