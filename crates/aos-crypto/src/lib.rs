//! # aos-crypto — Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for the AOS policy stack:
//!
//! - **Ed25519** signing and verification over document digests. Signing
//!   input MUST be `&DocDigest` — you cannot sign raw bytes or canonical
//!   bytes directly, which pins the signing surface to the 32-byte SHA-256
//!   digest.
//! - **Key-material decoding** that accepts 64/128-character hex or
//!   standard Base64, resolving the ambiguity hex-first.
//!
//! ## Crate Policy
//!
//! - Depends only on `aos-core` internally.
//! - No mocking of cryptographic operations in tests — all tests use real
//!   digests and real Ed25519 keys.
//! - Private keys are never serialized or logged, and are zeroized on drop.

pub mod ed25519;
pub mod error;
pub mod keys;

pub use ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
pub use error::CryptoError;
pub use keys::decode_key_material;
