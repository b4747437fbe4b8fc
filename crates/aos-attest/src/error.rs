//! # Record-Level Error Types
//!
//! Errors for signature-record and attestation-record handling. Parse
//! failures stay distinct from semantic failures so callers can map them
//! to different exit codes.

use thiserror::Error;

/// Errors from signing or verifying a constitution signature record.
#[derive(Error, Debug)]
pub enum SignatureError {
    /// The constitution YAML could not be canonicalized.
    #[error(transparent)]
    Constitution(#[from] aos_core::ParseError),

    /// The signature record JSON could not be parsed.
    #[error("signature record parse error: {0}")]
    Record(#[from] serde_json::Error),

    /// The record's `doc_hash` does not match the recomputed document
    /// hash. Ed25519 verification is not attempted.
    #[error("doc_hash mismatch: expected {expected}, got {found}")]
    HashMismatch {
        /// Hash recomputed from the document.
        expected: String,
        /// Hash stored in the record.
        found: String,
    },

    /// Ed25519 verification failed for the recorded signature.
    #[error("bad signature: {0}")]
    BadSignature(String),

    /// Key material or signature encoding problems.
    #[error(transparent)]
    Crypto(#[from] aos_crypto::CryptoError),
}

/// Errors from checking an attestation record.
#[derive(Error, Debug)]
pub enum AttestationError {
    /// The attestation JSON could not be parsed.
    #[error("attestation parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The record violates the attestation contract: a required field is
    /// missing or malformed, or the `spec` string is unsupported.
    #[error("attestation schema violation: {0}")]
    SchemaViolation(String),
}
