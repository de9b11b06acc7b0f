//! Stable hashing for generated identifiers.
//!
//! Uses SHA256 so class names do not change between runs or builds.

use sha2::{Digest, Sha256};

/// Hex SHA256 digest of `value`.
#[must_use]
pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// CSS class for a status name: `status-` plus the first 8 hex digits of its hash.
#[must_use]
pub fn status_css_class(status: &str) -> String {
    let digest = sha256_hex(status);
    format!("status-{}", &digest[..8])
}
