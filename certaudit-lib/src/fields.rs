//! Certificate data types.

use crate::util;
use serde::Serialize;

/// One certificate of a served chain, reduced to the fields the checks use.
///
/// Built by [`crate::parse_der`]. Issuer links live in
/// [`crate::CertificateChain`], not on the node itself.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateNode {
    /// Subject distinguished name.
    pub subject: DistinguishedName,
    /// Issuer distinguished name.
    pub issuer: DistinguishedName,
    /// Validity start date.
    pub not_before: DateTime,
    /// Validity end date.
    pub not_after: DateTime,
    /// DNS names from the Subject Alternative Name extension, in order.
    pub subject_alt_names: Vec<String>,
    /// Signature algorithm name (e.g. "sha256WithRSAEncryption").
    pub signature_algorithm: String,
    /// SHA-256 fingerprint of the DER encoding.
    pub fingerprint: String,
    /// Extended Key Usage purposes (e.g. "TLS Web Server Authentication").
    pub extended_key_usage: Vec<String>,

    /// Raw DER bytes of the entire certificate.
    #[serde(skip)]
    pub raw_der: Vec<u8>,
    /// Raw DER-encoded subject name, compared byte-for-byte when linking issuers.
    #[serde(skip)]
    pub raw_subject: Vec<u8>,
    /// Raw DER-encoded issuer name.
    #[serde(skip)]
    pub raw_issuer: Vec<u8>,
}

impl CertificateNode {
    /// Whether subject and issuer names are byte-identical.
    pub fn is_self_issued(&self) -> bool {
        self.raw_subject == self.raw_issuer
    }

    /// Subject common name, if present.
    pub fn common_name(&self) -> Option<&str> {
        self.subject.common_name()
    }

    /// Short human-readable label: CN, then O, then OU, then "Unknown".
    pub fn short_name(&self) -> &str {
        ["CN", "O", "OU"]
            .iter()
            .find_map(|key| self.subject.get(key))
            .unwrap_or("Unknown")
    }
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    /// Ordered list of (attribute_type, value) pairs.
    /// Attribute types use short names where known (e.g., "CN", "O", "C").
    pub components: Vec<(String, String)>,
}

impl DistinguishedName {
    /// First value of the given attribute, by short name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn common_name(&self) -> Option<&str> {
        self.get("CN")
    }

    /// Format as a comma-separated one-line string matching OpenSSL's default format.
    /// Example: "C = US, O = Org, CN = example.com"
    ///
    /// Commas, equals signs and backslashes inside values are escaped.
    pub fn to_oneline(&self) -> String {
        self.components
            .iter()
            .map(|(k, v)| {
                let mut escaped = String::with_capacity(v.len());
                for ch in v.chars() {
                    if matches!(ch, '\\' | ',' | '=') {
                        escaped.push('\\');
                    }
                    escaped.push(ch);
                }
                format!("{} = {}", k, escaped)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// Date-time representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateTime {
    /// ISO 8601 formatted string.
    pub iso8601: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl DateTime {
    pub fn from_timestamp(timestamp: i64) -> Self {
        DateTime {
            iso8601: util::format_iso8601(timestamp),
            timestamp,
        }
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso8601)
    }
}
