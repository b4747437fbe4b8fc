//! # aos-attest — Signature Records and Attestation Contracts
//!
//! The layer between raw Ed25519 primitives and the policy tooling:
//!
//! - **Signature records** (`aos-policy-signature-v1`): detached JSON
//!   records binding a constitution's canonical-JSON SHA-256 to an
//!   Ed25519 signature over the raw 32-byte digest. Verification
//!   recomputes the digest from the YAML source and distinguishes
//!   [`SignatureError::HashMismatch`] (the document changed) from
//!   [`SignatureError::BadSignature`] (the signature is wrong).
//!
//! - **Attestation records** (`gittruth-attestation-v1`): structural
//!   validation of the external attestation contract. Cryptographic
//!   verification of the tree hash and commit binding belongs to the
//!   external verifier; this crate only enforces the record shape it
//!   must satisfy.

pub mod attestation;
pub mod error;
pub mod signature;

pub use attestation::{check_attestation, AttestationRecord, AttestationReport, ATTESTATION_SPEC};
pub use error::{AttestationError, SignatureError};
pub use signature::{sign_yaml, verify_yaml, SignatureRecord, SIGNATURE_SPEC};
