//! # Detached Signature Records
//!
//! A constitution is signed out-of-band: the YAML stays untouched and a
//! JSON record carries the signature. The signed message is the raw
//! 32-byte SHA-256 of the canonical JSON bytes — a fixed signing surface
//! that any tooling can reproduce from the YAML alone.
//!
//! ## Verification Order
//!
//! Verification recomputes the document hash first and fails with
//! [`SignatureError::HashMismatch`] before any curve work. Only a record
//! whose `doc_hash` matches the document proceeds to Ed25519
//! verification, which fails with [`SignatureError::BadSignature`].

use aos_core::{sha256_digest, CanonicalBytes};
use aos_crypto::{Ed25519Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::error::SignatureError;

/// Spec identifier for constitution signature records.
pub const SIGNATURE_SPEC: &str = "aos-policy-signature-v1";

/// A detached signature over a constitution document.
///
/// The `signature` field is standard Base64 of the 64-byte Ed25519
/// signature; `doc_hash` is the `sha256:<hex>` form of the signed digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Record format identifier, [`SIGNATURE_SPEC`].
    pub spec: String,
    /// `sha256:<hex>` of the document's canonical JSON bytes.
    pub doc_hash: String,
    /// Optional signing timestamp (RFC 3339, informational only).
    pub signed_at: Option<String>,
    /// Identifier of the signing key, e.g. `ed25519:release-2026`.
    pub key_id: String,
    /// Standard Base64 of the 64-byte Ed25519 signature.
    pub signature: String,
}

impl SignatureRecord {
    /// Parse a record from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SignatureError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render the record as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SignatureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Sign a constitution YAML document, producing a detached record.
///
/// Canonicalizes the YAML, hashes it, and signs the raw 32-byte digest.
///
/// # Errors
///
/// Returns [`SignatureError::Constitution`] when the YAML cannot be
/// canonicalized.
pub fn sign_yaml(
    yaml: &str,
    key: &SigningKey,
    key_id: &str,
    signed_at: Option<String>,
) -> Result<SignatureRecord, SignatureError> {
    let canonical = CanonicalBytes::from_yaml_str(yaml)?;
    let digest = sha256_digest(&canonical);
    let signature = key.sign(&digest);
    Ok(SignatureRecord {
        spec: SIGNATURE_SPEC.to_string(),
        doc_hash: digest.prefixed(),
        signed_at,
        key_id: key_id.to_string(),
        signature: signature.to_base64(),
    })
}

/// Verify a detached signature record against a constitution YAML
/// document.
///
/// # Errors
///
/// - [`SignatureError::Constitution`] — the YAML cannot be canonicalized.
/// - [`SignatureError::HashMismatch`] — the record's `doc_hash` differs
///   from the recomputed hash; Ed25519 verification is skipped.
/// - [`SignatureError::Crypto`] — the recorded signature is not valid
///   Base64 of 64 bytes.
/// - [`SignatureError::BadSignature`] — Ed25519 verification failed.
pub fn verify_yaml(
    yaml: &str,
    record: &SignatureRecord,
    key: &VerifyingKey,
) -> Result<(), SignatureError> {
    let canonical = CanonicalBytes::from_yaml_str(yaml)?;
    let digest = sha256_digest(&canonical);
    let expected = digest.prefixed();
    if record.doc_hash != expected {
        return Err(SignatureError::HashMismatch {
            expected,
            found: record.doc_hash.clone(),
        });
    }
    let signature = Ed25519Signature::from_base64(&record.signature)?;
    key.verify(&digest, &signature)
        .map_err(|e| SignatureError::BadSignature(e.to_string()))
}
