//! # Document Digest — SHA-256 over Canonical Bytes
//!
//! Defines [`DocDigest`] and the digest functions for the policy stack.
//!
//! ## Security Invariant
//!
//! [`sha256_digest()`] accepts only `&CanonicalBytes`, so every digest in
//! the system is computed from properly canonicalized data. Raw-byte
//! hashing is a compile error.
//!
//! The raw 32-byte digest is the signing surface for detached signatures;
//! the textual `sha256:<hex>` form appears in signature records and scope
//! hashes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 document digest.
///
/// Produced exclusively from [`CanonicalBytes`]. The raw 32 bytes are what
/// gets signed; [`DocDigest::prefixed()`] renders the `sha256:<hex>` form
/// used in records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocDigest([u8; 32]);

impl DocDigest {
    /// Construct from raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw 32-byte digest value.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Render the digest in its prefixed textual form, `sha256:<hex>`.
    pub fn prefixed(&self) -> String {
        format!("sha256:{}", self.to_hex())
    }
}

impl std::fmt::Display for DocDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prefixed())
    }
}

/// Compute a SHA-256 digest from canonical bytes.
///
/// This is the only digest path in the stack. The signature enforces that
/// the input flowed through canonicalization.
pub fn sha256_digest(data: &CanonicalBytes) -> DocDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    DocDigest(bytes)
}

/// Compute the prefixed `sha256:<hex>` form from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).prefixed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_is_stable_for_equal_canonical_bytes() {
        let a = CanonicalBytes::new(&json!({"x": 1, "y": [1, 2]})).unwrap();
        let b = CanonicalBytes::new(&json!({"y": [1, 2], "x": 1})).unwrap();
        assert_eq!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn prefixed_form_is_sha256_colon_hex() {
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        let digest = sha256_digest(&cb);
        let text = digest.prefixed();
        assert!(text.starts_with("sha256:"));
        assert_eq!(text.len(), "sha256:".len() + 64);
        assert!(text["sha256:".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn known_vector_empty_object() {
        // SHA-256 of the two bytes "{}".
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn display_matches_prefixed() {
        let cb = CanonicalBytes::new(&json!({"a": 1})).unwrap();
        let digest = sha256_digest(&cb);
        assert_eq!(format!("{digest}"), digest.prefixed());
    }
}
