//! Certificate fingerprint computation.

use crate::util;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of DER-encoded certificate bytes.
///
/// Returns a colon-separated uppercase hex string (e.g., "AB:CD:EF:...").
/// The fingerprint is the identity key used when walking issuer links.
pub fn compute_fingerprint(der_bytes: &[u8]) -> String {
    util::hex_colon_upper(&Sha256::digest(der_bytes))
}
