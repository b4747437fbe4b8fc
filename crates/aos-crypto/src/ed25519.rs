//! # Ed25519 Signing and Verification
//!
//! Provides Ed25519 digital signatures for constitution signature records
//! using the `ed25519-dalek` crate.
//!
//! ## Security Invariant
//!
//! Signing operations take [`DocDigest`] — the raw 32-byte SHA-256 of the
//! canonical document bytes. You **cannot** sign raw bytes, and you cannot
//! sign the hex rendering of a digest: the type system pins the signing
//! surface to exactly one shape, so tooling in any language produces
//! interoperable signatures.
//!
//! ## Serde
//!
//! Public keys and signatures serialize as lowercase hex strings. Signing
//! keys intentionally do not implement `Serialize` and are zeroized on
//! drop.

use aos_core::DocDigest;
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::keys::{bytes_to_hex, decode_key_material, hex_to_bytes};

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

/// An Ed25519 digital signature (64 bytes).
///
/// Wraps the raw 64-byte signature value. Serializes as a lowercase hex
/// string; the Base64 form used inside signature records is available via
/// [`Ed25519Signature::to_base64()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Signature([u8; 64]);

impl Ed25519Signature {
    /// Construct from raw 64-byte signature.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Construct from a byte slice, validating length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Access the raw 64-byte signature value.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Encode the signature as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Decode a signature from a hex string (128 hex chars → 64 bytes).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(s.trim()).map_err(CryptoError::SignatureDecode)?;
        Self::from_slice(&bytes)
    }

    /// Encode the signature as standard Base64 (the record wire form).
    pub fn to_base64(&self) -> String {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        STANDARD.encode(self.0)
    }

    /// Decode a signature from standard Base64.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| CryptoError::SignatureDecode(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SigningKey
// ---------------------------------------------------------------------------

/// An Ed25519 signing (private) key.
///
/// Signing input **must** be `&DocDigest` — raw byte signing is not
/// exposed.
///
/// ## Security
///
/// This type intentionally does **not** implement `Serialize`. Private
/// keys must not be casually serialized. Use [`SigningKey::to_bytes()`]
/// for explicit key export when required. Key material is zeroized on
/// drop.
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate a new random Ed25519 signing key.
    pub fn generate<R: rand_core::CryptoRngCore>(csprng: &mut R) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(csprng),
        }
    }

    /// Construct from raw 32-byte private key material.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Construct from a hex or Base64 key string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDecode`] when the string decodes as
    /// neither, and [`CryptoError::InvalidKeyLength`] when the decoded
    /// material is not exactly 32 bytes.
    pub fn from_key_material(s: &str) -> Result<Self, CryptoError> {
        let bytes = decode_key_material(s)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                got: bytes.len(),
            })?;
        Ok(Self::from_bytes(&arr))
    }

    /// Derive the corresponding public verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a document digest.
    ///
    /// The input **must** be `&DocDigest`: the signed message is the raw
    /// 32-byte digest, never its hex rendering and never the canonical
    /// bytes themselves.
    pub fn sign(&self, digest: &DocDigest) -> Ed25519Signature {
        let sig = self.inner.sign(digest.as_bytes());
        Ed25519Signature(sig.to_bytes())
    }

    /// Export the raw 32-byte private key material.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Export the private key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.inner.to_bytes())
    }
}

// Implement Debug manually to avoid leaking key material.
impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.verifying_key().to_hex())
            .finish()
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        // Extract key bytes, explicitly zeroize them, then overwrite the
        // inner key with the zero key. ed25519_dalek's own ZeroizeOnDrop
        // (via cargo feature) is the second layer.
        let mut key_bytes = self.inner.to_bytes();
        key_bytes.zeroize();
        self.inner = ed25519_dalek::SigningKey::from_bytes(&[0u8; 32]);
    }
}

// ---------------------------------------------------------------------------
// VerifyingKey
// ---------------------------------------------------------------------------

/// An Ed25519 verifying (public) key.
///
/// Serializes as a lowercase hex string (64 hex chars = 32 bytes).
#[derive(Debug, Clone)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

impl VerifyingKey {
    /// Construct from raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Construct from a hex string (64 hex chars → 32 bytes).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(s.trim()).map_err(CryptoError::KeyDecode)?;
        let arr: [u8; 32] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: 32,
                    got: bytes.len(),
                })?;
        Self::from_bytes(&arr)
    }

    /// Construct from a hex or Base64 key string (hex tried first).
    pub fn from_key_material(s: &str) -> Result<Self, CryptoError> {
        let bytes = decode_key_material(s)?;
        let arr: [u8; 32] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: 32,
                    got: bytes.len(),
                })?;
        Self::from_bytes(&arr)
    }

    /// Access the raw 32-byte public key value.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Encode the public key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.inner.to_bytes())
    }

    /// Verify an Ed25519 signature over a document digest.
    ///
    /// The digest **must** be `&DocDigest`, matching the signing path.
    pub fn verify(
        &self,
        digest: &DocDigest,
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        self.inner
            .verify(digest.as_bytes(), &sig)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl PartialEq for VerifyingKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for VerifyingKey {}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
