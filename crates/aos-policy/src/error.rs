//! # Constitution Load Errors
//!
//! Errors raised while loading a constitution. Parsing (`ParseError`) and
//! schema validation (`SchemaViolation`) stay distinct: unknown rule
//! fields and unknown `when` predicates are ignored for forward
//! compatibility, but a value that parses and then fails validation —
//! an unknown `action`, an unknown risk level — is a schema violation,
//! not a parse failure.

use thiserror::Error;

/// A constitution document could not be loaded.
#[derive(Error, Debug)]
pub enum ConstitutionError {
    /// The YAML could not be parsed or is not representable in JSON.
    #[error(transparent)]
    Parse(#[from] aos_core::ParseError),

    /// The document parsed but violates the constitution schema.
    #[error("schema violation: {0}")]
    SchemaViolation(String),
}
