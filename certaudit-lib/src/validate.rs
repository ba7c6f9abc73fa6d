//! The validation pipeline for one hostname.

use crate::authorize::authorize;
use crate::chain::{link_chain, CertificateChain};
use crate::checks::{
    check_authorization, check_hostname, check_key_usage, check_root, check_validity, walk_chain,
    CERTIFICATE_PARSE, CERTIFICATE_RETRIEVAL, TLS_CONNECTION,
};
use crate::fetch::{fetch_chain, ServedChain};
use crate::parser::parse_der;
use crate::results::ValidationRun;
use crate::trust_store::TrustStore;
use crate::util;
use std::time::Duration;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 443;

/// Bound on connecting plus handshaking.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings shared by every hostname of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    pub port: u16,
    pub timeout: Duration,
    /// Unix time to validate at instead of the current time.
    pub at_time: Option<i64>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            at_time: None,
        }
    }
}

/// Outcome of validating one hostname.
#[derive(Debug, Clone)]
pub struct Validation {
    pub run: ValidationRun,
    /// The linked chain, when the leaf could be retrieved and parsed.
    pub chain: Option<CertificateChain>,
}

/// Runs the ordered checks against a trust store.
#[derive(Debug)]
pub struct Validator {
    trust_store: TrustStore,
    roots: rustls::RootCertStore,
    options: ValidateOptions,
}

impl Validator {
    pub fn new(trust_store: TrustStore, options: ValidateOptions) -> Self {
        let roots = trust_store.root_cert_store();
        Validator {
            trust_store,
            roots,
            options,
        }
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    /// Connect to `hostname` and validate what it serves.
    ///
    /// A connection failure is recorded as a FAILED `certificate-retrieval`
    /// result; nothing else runs for that host.
    pub fn validate_host(&self, hostname: &str) -> Validation {
        match fetch_chain(hostname, self.options.port, self.options.timeout) {
            Ok(served) => self.validate_served(hostname, &served),
            Err(e) => {
                tracing::warn!(hostname, port = self.options.port, error = %e, "certificate retrieval failed");
                let mut run = ValidationRun::new(hostname, self.now());
                run.failed(
                    CERTIFICATE_RETRIEVAL,
                    format!(
                        "SSL certificate not accessible on {}:{}: {}",
                        hostname, self.options.port, e
                    ),
                );
                Validation { run, chain: None }
            }
        }
    }

    /// Validate an already retrieved chain as if it were served for `hostname`.
    pub fn validate_served(&self, hostname: &str, served: &ServedChain) -> Validation {
        let mut run = ValidationRun::new(hostname, self.now());

        let Some((leaf_der, rest)) = served.certificates.split_first() else {
            run.failed(
                CERTIFICATE_RETRIEVAL,
                format!("No certificates were presented by {}", served.origin),
            );
            return Validation { run, chain: None };
        };
        run.passed(
            CERTIFICATE_RETRIEVAL,
            format!(
                "SSL certificate accessible: {} certificate(s) from {}",
                served.certificates.len(),
                served.origin
            ),
        );

        if let Some(protocol) = &served.protocol {
            let message = match &served.cipher_suite {
                Some(cipher) => format!("TLS connection established using {} ({})", protocol, cipher),
                None => format!("TLS connection established using {}", protocol),
            };
            run.passed(TLS_CONNECTION, message);
        }

        let leaf = match parse_der(leaf_der) {
            Ok(leaf) => leaf,
            Err(e) => {
                run.failed(CERTIFICATE_PARSE, format!("Could not parse the leaf certificate: {}", e));
                return Validation { run, chain: None };
            }
        };

        check_hostname(&leaf, &mut run);
        check_validity(&leaf, &mut run);

        let mut nodes = vec![leaf];
        for (i, der) in rest.iter().enumerate() {
            match parse_der(der) {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    tracing::warn!(hostname, position = i + 1, error = %e, "skipping unparseable chain certificate");
                }
            }
        }
        let chain = link_chain(nodes, &self.trust_store);

        walk_chain(&chain, &mut run);

        let verdict = authorize(&served.certificates, &self.roots, hostname, run.now());
        check_authorization(&verdict, &mut run);
        check_root(&chain, &mut run);
        if let Some(leaf) = chain.leaf() {
            check_key_usage(leaf, &mut run);
        }

        Validation {
            run,
            chain: Some(chain),
        }
    }

    /// The validation instant: `at_time` when set, else the current time.
    pub fn now(&self) -> i64 {
        self.options.at_time.unwrap_or_else(util::now_timestamp)
    }
}
