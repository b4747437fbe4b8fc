//! # Parse Error Types
//!
//! Errors raised while loading documents into canonical form. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! A `ParseError` is always surfaced to the caller — it never turns into an
//! evaluation result. Once a document has parsed, everything downstream
//! (classification, rule evaluation, scope hashing) is total.

use thiserror::Error;

/// A document could not be loaded or is not representable as canonical JSON.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The YAML source could not be parsed at all.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mapping uses a key that is not a string.
    #[error("mapping key is not a string: {0}")]
    NonStringKey(String),

    /// A number has no JSON representation (NaN or infinity).
    #[error("number is not representable in JSON: {0}")]
    NonFiniteNumber(f64),

    /// A YAML node kind that canonical JSON cannot express (e.g. a tag).
    #[error("unsupported YAML node: {0}")]
    UnsupportedNode(String),
}
