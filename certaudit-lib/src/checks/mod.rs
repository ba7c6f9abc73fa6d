//! The individual certificate checks.
//!
//! Each check reads from a [`crate::CertificateChain`] (or a single node) and
//! appends its outcome to a [`crate::ValidationRun`]. None of them return
//! errors: a problem with the certificate is a FAILED or WARNING record.

pub mod chain_walk;
pub mod hostname;
pub mod signature;
pub mod trust;
pub mod validity;

pub use chain_walk::{classify_hops, walk_chain, ChainWalk};
pub use hostname::{check_hostname, matches};
pub use signature::audit_signatures;
pub use trust::{check_authorization, check_key_usage, check_root};
pub use validity::{check_validity, EXPIRY_WARNING_DAYS, MAX_LIFETIME_DAYS};

/// Test names, in the order a full run records them.
pub const CERTIFICATE_RETRIEVAL: &str = "certificate-retrieval";
pub const TLS_CONNECTION: &str = "tls-connection";
pub const CERTIFICATE_PARSE: &str = "certificate-parse";
pub const SUBJECT_SAN_MATCH: &str = "subject-san-match";
pub const VALIDITY_DATES: &str = "validity-dates";
pub const CERTIFICATE_LIFETIME: &str = "certificate-lifetime";
pub const CERTIFICATE_CHAIN: &str = "certificate-chain";
pub const SIGNATURE_ALGORITHMS: &str = "signature-algorithms";
pub const CA_TRUST: &str = "ca-trust";
pub const ROOT_CERTIFICATE: &str = "root-certificate";
pub const KEY_USAGE: &str = "key-usage";

const SECONDS_PER_DAY: i64 = 86_400;
