//! Certificate parsing from PEM and DER formats.

use crate::fields::{CertificateNode, DateTime, DistinguishedName};
use crate::fingerprint::compute_fingerprint;
use crate::oid;
use crate::util;
use crate::CertAuditError;
use x509_parser::prelude::*;

/// Parse a certificate from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_cert(input: &[u8]) -> Result<CertificateNode, CertAuditError> {
    if input.is_empty() {
        return Err(CertAuditError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse the first certificate of a PEM document.
pub fn parse_pem(input: &[u8]) -> Result<CertificateNode, CertAuditError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| CertAuditError::PemError(format!("{}", e)))?;

    if pem.label != "CERTIFICATE" && pem.label != "TRUSTED CERTIFICATE" {
        return Err(CertAuditError::PemError(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<CertificateNode, CertAuditError> {
    let (remaining, x509) = X509Certificate::from_der(input)
        .map_err(|e| CertAuditError::DerError(format!("{}", e)))?;

    // Fingerprint only the certificate itself, never trailing bytes.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    Ok(build_node(&x509, cert_der))
}

/// Split a PEM bundle into DER-encoded certificates, in file order.
///
/// Non-certificate blocks (keys, CRLs) are skipped. Garbage after at least
/// one certificate ends the bundle; garbage before any certificate is an error.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<Vec<u8>>, CertAuditError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if pem.label == "CERTIFICATE" || pem.label == "TRUSTED CERTIFICATE" {
                    certs.push(pem.contents);
                }
            }
            Err(e) => {
                if !certs.is_empty() {
                    break;
                }
                return Err(CertAuditError::PemError(format!(
                    "failed to parse PEM: {}",
                    e
                )));
            }
        }
    }

    if certs.is_empty() {
        return Err(CertAuditError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }

    Ok(certs)
}

fn build_node(x509: &X509Certificate, raw_der: &[u8]) -> CertificateNode {
    let tbs = &x509.tbs_certificate;

    CertificateNode {
        subject: build_dn(&tbs.subject),
        issuer: build_dn(&tbs.issuer),
        not_before: DateTime::from_timestamp(tbs.validity.not_before.timestamp()),
        not_after: DateTime::from_timestamp(tbs.validity.not_after.timestamp()),
        subject_alt_names: extract_san_dns_names(x509),
        signature_algorithm: format_sig_algorithm(&x509.signature_algorithm),
        fingerprint: compute_fingerprint(raw_der),
        extended_key_usage: extract_ext_key_usage(x509),
        raw_der: raw_der.to_vec(),
        raw_subject: tbs.subject.as_raw().to_vec(),
        raw_issuer: tbs.issuer.as_raw().to_vec(),
    }
}

fn format_sig_algorithm(algo: &AlgorithmIdentifier) -> String {
    match algo.algorithm.to_id_string().as_str() {
        oid::MD2_WITH_RSA => "md2WithRSAEncryption".into(),
        oid::MD5_WITH_RSA => "md5WithRSAEncryption".into(),
        oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
        oid::RSASSA_PSS => "rsassaPss".into(),
        oid::SHA224_WITH_RSA => "sha224WithRSAEncryption".into(),
        oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
        oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
        oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
        oid::DSA_WITH_SHA1 => "dsaWithSHA1".into(),
        oid::ECDSA_WITH_SHA1 => "ecdsa-with-SHA1".into(),
        oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
        oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
        oid::ECDSA_WITH_SHA512 => "ecdsa-with-SHA512".into(),
        oid::ED25519 => "Ed25519".into(),
        oid::ED448 => "Ed448".into(),
        other => other.to_string(),
    }
}

fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = attr.as_str().unwrap_or("<binary>").to_string();
            components.push((key, value));
        }
    }
    DistinguishedName { components }
}

/// DNS names from the SAN extension. Other name types are ignored.
fn extract_san_dns_names(cert: &X509Certificate) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for gn in &san.value.general_names {
            if let GeneralName::DNSName(name) = gn {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn extract_ext_key_usage(cert: &X509Certificate) -> Vec<String> {
    let Ok(Some(ext)) = cert.extended_key_usage() else {
        return Vec::new();
    };
    let eku = ext.value;
    let mut usages = Vec::new();
    if eku.any {
        usages.push("Any Extended Key Usage".into());
    }
    if eku.server_auth {
        usages.push("TLS Web Server Authentication".into());
    }
    if eku.client_auth {
        usages.push("TLS Web Client Authentication".into());
    }
    if eku.code_signing {
        usages.push("Code Signing".into());
    }
    if eku.email_protection {
        usages.push("E-mail Protection".into());
    }
    if eku.time_stamping {
        usages.push("Time Stamping".into());
    }
    if eku.ocsp_signing {
        usages.push("OCSP Signing".into());
    }
    for other in &eku.other {
        usages.push(eku_oid_to_name(&other.to_id_string()));
    }
    usages
}

/// Names for EKU OIDs that `ExtendedKeyUsage` has no boolean field for.
fn eku_oid_to_name(oid_str: &str) -> String {
    match oid_str {
        oid::EKU_IPSEC_END_SYSTEM => "IPSec End System".into(),
        oid::EKU_IPSEC_TUNNEL => "IPSec Tunnel".into(),
        oid::EKU_IPSEC_USER => "IPSec User".into(),
        oid::EKU_MS_SERVER_GATED_CRYPTO => "Microsoft Server Gated Crypto".into(),
        oid::EKU_NS_SERVER_GATED_CRYPTO => "Netscape Server Gated Crypto".into(),
        other => other.to_string(),
    }
}
