//! Trusted CA certificates.
//!
//! [`TrustStore`] serves two purposes: issuer lookup by subject name when
//! linking a served chain to its root, and the root set handed to rustls
//! when computing the authorization verdict.

use crate::CertAuditError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use x509_parser::prelude::*;

/// Well-known CA bundle file paths, in order of preference.
const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// A set of trusted CA certificates, indexed by raw subject name.
pub struct TrustStore {
    certs_by_subject: HashMap<Vec<u8>, Vec<Vec<u8>>>,
    count: usize,
}

impl std::fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustStore")
            .field("count", &self.count)
            .finish()
    }
}

impl TrustStore {
    pub fn new() -> Self {
        TrustStore {
            certs_by_subject: HashMap::new(),
            count: 0,
        }
    }

    /// Load the system trust store, searching where OpenSSL does.
    ///
    /// Bundle files are tried first ([`find_system_ca_bundle`]), then
    /// `SSL_CERT_DIR`, the `openssl-probe` directory and [`KNOWN_CA_DIR_PATHS`].
    pub fn system() -> Result<Self, CertAuditError> {
        let probe = openssl_probe::probe();
        let dir_candidates = std::env::var_os("SSL_CERT_DIR")
            .map(PathBuf::from)
            .into_iter()
            .chain(probe.cert_dir)
            .chain(KNOWN_CA_DIR_PATHS.iter().map(PathBuf::from));
        Self::from_locations(find_system_ca_bundle(), dir_candidates)
    }

    /// Load from the first location that yields at least one certificate.
    ///
    /// A bundle that cannot be read or parsed falls through to the directories.
    fn from_locations(
        bundle: Option<PathBuf>,
        dirs: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Self, CertAuditError> {
        let mut store = TrustStore::new();

        if let Some(bundle_path) = bundle {
            tracing::debug!(path = %bundle_path.display(), "loading CA bundle");
            match std::fs::read(&bundle_path)
                .map_err(CertAuditError::from)
                .and_then(|data| store.add_pem_bundle(&data))
            {
                Ok(added) if added > 0 => return Ok(store),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %bundle_path.display(), error = %e, "unusable CA bundle");
                }
            }
        }

        for dir in dirs {
            tracing::debug!(path = %dir.display(), "loading CA directory");
            if let Ok(added) = store.add_pem_directory(&dir) {
                if added > 0 {
                    return Ok(store);
                }
            }
        }

        Err(CertAuditError::TrustStore(
            "no system trust store found".into(),
        ))
    }

    pub fn from_pem(pem_data: &[u8]) -> Result<Self, CertAuditError> {
        let mut store = TrustStore::new();
        store.add_pem_bundle(pem_data)?;
        Ok(store)
    }

    pub fn from_pem_file(path: &Path) -> Result<Self, CertAuditError> {
        let data = std::fs::read(path).map_err(|e| {
            CertAuditError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Self::from_pem(&data)
    }

    /// Add a DER-encoded certificate to the store.
    pub fn add_der(&mut self, der: &[u8]) -> Result<(), CertAuditError> {
        let (_, x509) = X509Certificate::from_der(der)
            .map_err(|e| CertAuditError::DerError(format!("{}", e)))?;

        self.certs_by_subject
            .entry(x509.subject().as_raw().to_vec())
            .or_default()
            .push(der.to_vec());
        self.count += 1;
        Ok(())
    }

    /// Add every certificate of a PEM bundle, skipping ones that fail to
    /// parse. Returns the number added.
    pub fn add_pem_bundle(&mut self, pem_data: &[u8]) -> Result<usize, CertAuditError> {
        let certs = crate::parser::parse_pem_chain(pem_data)?;
        Ok(certs
            .iter()
            .filter(|der| self.add_der(der).is_ok())
            .count())
    }

    /// Load `.pem`, `.crt`, `.cer` and hash-linked (`XXXXXXXX.N`) files from a directory.
    fn add_pem_directory(&mut self, dir: &Path) -> Result<usize, CertAuditError> {
        let mut total = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_pem_cert_file(&path) {
                continue;
            }
            if let Ok(data) = std::fs::read(&path) {
                total += self.add_pem_bundle(&data).unwrap_or(0);
            }
        }
        Ok(total)
    }

    /// Trusted certificates whose subject matches the given raw issuer name.
    pub fn find_by_subject_raw(&self, subject_raw: &[u8]) -> &[Vec<u8>] {
        self.certs_by_subject
            .get(subject_raw)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Build the rustls root set from this store.
    ///
    /// Certificates rustls cannot use as trust anchors are skipped and logged.
    pub fn root_cert_store(&self) -> rustls::RootCertStore {
        let mut roots = rustls::RootCertStore::empty();
        for der in self.certs_by_subject.values().flatten() {
            let cert = rustls::pki_types::CertificateDer::from(der.clone());
            if let Err(e) = roots.add(cert) {
                tracing::debug!(error = %e, "skipping unusable trust anchor");
            }
        }
        roots
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for TrustStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_pem_cert_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().all(|b| b.is_ascii_digit()))
}

/// Find the system CA bundle path.
///
/// Checks `SSL_CERT_FILE`, then the `openssl-probe` result, then
/// well-known distribution paths.
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    std::env::var_os("SSL_CERT_FILE")
        .map(PathBuf::from)
        .into_iter()
        .chain(openssl_probe::probe().cert_file)
        .chain(KNOWN_CA_BUNDLE_PATHS.iter().map(PathBuf::from))
        .find(|p| p.exists())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hash_linked_names_are_cert_files() {
        assert!(is_pem_cert_file(Path::new("a1b2c3d4.0")));
        assert!(is_pem_cert_file(Path::new("root.crt")));
        assert!(!is_pem_cert_file(Path::new("README")));
        assert!(!is_pem_cert_file(Path::new("a1b2c3d4.10")));
    }

    #[test]
    fn empty_store_has_no_issuers() {
        let store = TrustStore::new();
        assert!(store.is_empty());
        assert!(store.find_by_subject_raw(b"anything").is_empty());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("certaudit-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fixture_root() -> Vec<u8> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.pop();
        std::fs::read(path.join("tests/certs/root.pem")).unwrap()
    }

    #[test]
    fn garbage_bundle_falls_back_to_directory() {
        let base = scratch_dir("garbage-bundle");
        let bundle = base.join("bundle.pem");
        std::fs::write(&bundle, b"-----BEGIN GARBAGE\nnot base64 at all\n").unwrap();
        let certs = base.join("certs");
        std::fs::create_dir_all(&certs).unwrap();
        std::fs::write(certs.join("root.pem"), fixture_root()).unwrap();

        let store = TrustStore::from_locations(Some(bundle), [certs]).unwrap();
        assert_eq!(store.len(), 1);
        std::fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn missing_locations_are_an_error() {
        let base = scratch_dir("missing-store");
        let result = TrustStore::from_locations(Some(base.join("absent.pem")), [base.join("absent")]);
        assert!(matches!(result, Err(CertAuditError::TrustStore(_))));
        std::fs::remove_dir_all(&base).unwrap();
    }
}
