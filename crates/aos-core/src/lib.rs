#![deny(missing_docs)]

//! # aos-core — Foundational Types for the AOS Policy Stack
//!
//! This crate defines the types that every other crate in the workspace
//! depends on. It has no internal crate dependencies — only `serde`,
//! `serde_json`, `serde_yaml`, `sha2`, and `thiserror` from the external
//! ecosystem.
//!
//! ## Design Principles
//!
//! 1. **[`CanonicalBytes`] is the sole path to digest computation.** Document
//!    hashes, scope hashes, and signature verification all flow through
//!    `CanonicalBytes`, which produces compact JSON with recursively sorted
//!    keys. One canonicalization function means the three call sites cannot
//!    drift apart.
//!
//! 2. **[`DocDigest`] can only be computed from `CanonicalBytes`.** The
//!    signature of [`sha256_digest()`] makes it a compile error to hash raw
//!    bytes that skipped canonicalization.
//!
//! 3. **[`ParseError`] hierarchy.** Structured errors with `thiserror` — no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::{yaml_to_value, CanonicalBytes};
pub use digest::{sha256_digest, sha256_hex, DocDigest};
pub use error::ParseError;
