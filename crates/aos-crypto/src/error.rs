//! # Cryptographic Error Types
//!
//! Structured errors for all cryptographic operations in `aos-crypto`.
//! Uses `thiserror` for ergonomic error definitions with diagnostic context.

use thiserror::Error;

/// Errors from cryptographic operations in the AOS policy stack.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key material is neither valid hex of the expected length nor valid
    /// Base64.
    #[error("could not decode key material: {0}")]
    KeyDecode(String),

    /// Decoded key material has the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength {
        /// Required byte length.
        expected: usize,
        /// Actual decoded byte length.
        got: usize,
    },

    /// The public key bytes do not describe a valid curve point.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid Ed25519 signature length.
    #[error("invalid Ed25519 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Signature encoding (hex or Base64) could not be decoded.
    #[error("could not decode signature: {0}")]
    SignatureDecode(String),

    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),
}
