//! # Attestation Contract Checking
//!
//! An attestation proves that a given commit contains the exact
//! constitution bytes that were signed. Producing and cryptographically
//! verifying attestations is the external verifier's job; this module
//! enforces the record shape that verifier consumes, so a malformed
//! record is rejected before it ever reaches the trust decision.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AttestationError;

/// Spec identifier for attestation records.
pub const ATTESTATION_SPEC: &str = "gittruth-attestation-v1";

/// Fields every attestation record must carry.
const REQUIRED_FIELDS: [&str; 7] = [
    "spec",
    "repo",
    "commit",
    "attestation_id",
    "tree_hash",
    "timestamp",
    "signature",
];

/// A structurally validated attestation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    /// Record format identifier, [`ATTESTATION_SPEC`].
    pub spec: String,
    /// Repository the attested commit lives in.
    pub repo: String,
    /// Commit containing the constitution and signature bytes.
    pub commit: String,
    /// Identifier of the attestation in the transparency log.
    pub attestation_id: String,
    /// `sha256:<hex>` of the attested tree.
    pub tree_hash: String,
    /// When the attestation was produced.
    pub timestamp: String,
    /// The attestation service's signature.
    pub signature: String,
}

/// The checker's success response, shaped identically to the external
/// verifier's output so callers can consume either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationReport {
    /// Always `true` for a report; failures are errors instead.
    pub ok: bool,
    /// The tree hash the record binds to.
    pub verified_tree_hash: String,
    /// The commit the record binds to.
    pub verified_commit: String,
    /// Trust anchor used. The structural checker cannot name a real
    /// trust root, so it reports `"structural-only"`; the external
    /// verifier overwrites this with its actual anchor.
    pub trust_root: String,
    /// Attestation identifier, echoed from the record.
    pub attestation_id: String,
    /// Attestation timestamp, echoed from the record.
    pub timestamp: String,
}

/// Validate the structural shape of an attestation record.
///
/// Checks required fields, the `spec` string, and the `sha256:` prefix on
/// `tree_hash`. Cryptographic verification of the tree hash and commit
/// binding is delegated to the external verifier.
///
/// # Errors
///
/// - [`AttestationError::Parse`] — the text is not JSON.
/// - [`AttestationError::SchemaViolation`] — a required field is missing
///   or not a string, the `spec` is unsupported, or the tree hash lacks
///   the `sha256:` prefix.
pub fn check_attestation(json: &str) -> Result<AttestationReport, AttestationError> {
    let value: Value = serde_json::from_str(json)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AttestationError::SchemaViolation("record is not an object".to_string()))?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .filter(|k| !obj.contains_key(**k))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(AttestationError::SchemaViolation(format!(
            "missing fields: {}",
            missing.join(", ")
        )));
    }

    let field = |key: &str| -> Result<String, AttestationError> {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AttestationError::SchemaViolation(format!("field {key} must be a string")))
    };

    let record = AttestationRecord {
        spec: field("spec")?,
        repo: field("repo")?,
        commit: field("commit")?,
        attestation_id: field("attestation_id")?,
        tree_hash: field("tree_hash")?,
        timestamp: field("timestamp")?,
        signature: field("signature")?,
    };

    if record.spec != ATTESTATION_SPEC {
        return Err(AttestationError::SchemaViolation(format!(
            "unsupported spec: {}",
            record.spec
        )));
    }

    if !record.tree_hash.starts_with("sha256:") {
        return Err(AttestationError::SchemaViolation(
            "tree_hash must be sha256:<hex>".to_string(),
        ));
    }

    Ok(AttestationReport {
        ok: true,
        verified_tree_hash: record.tree_hash,
        verified_commit: record.commit,
        trust_root: "structural-only".to_string(),
        attestation_id: record.attestation_id,
        timestamp: record.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "spec": "gittruth-attestation-v1",
            "repo": "openclaw/constitution",
            "commit": "0123abcd",
            "attestation_id": "att-7",
            "tree_hash": "sha256:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "timestamp": "2026-01-15T12:00:00Z",
            "signature": "c2lnbmF0dXJl"
        })
    }

    #[test]
    fn valid_record_produces_report() {
        let report = check_attestation(&valid_record().to_string()).unwrap();
        assert!(report.ok);
        assert_eq!(report.verified_commit, "0123abcd");
        assert_eq!(report.attestation_id, "att-7");
        assert_eq!(report.trust_root, "structural-only");
    }

    #[test]
    fn missing_field_is_schema_violation() {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove("commit");
        let err = check_attestation(&record.to_string()).unwrap_err();
        match err {
            AttestationError::SchemaViolation(msg) => assert!(msg.contains("commit")),
            other => panic!("expected SchemaViolation, got {other}"),
        }
    }

    #[test]
    fn wrong_spec_rejected() {
        let mut record = valid_record();
        record["spec"] = json!("gittruth-attestation-v2");
        let err = check_attestation(&record.to_string()).unwrap_err();
        assert!(matches!(err, AttestationError::SchemaViolation(_)));
    }

    #[test]
    fn tree_hash_must_carry_sha256_prefix() {
        let mut record = valid_record();
        record["tree_hash"] = json!("md5:abc");
        let err = check_attestation(&record.to_string()).unwrap_err();
        assert!(matches!(err, AttestationError::SchemaViolation(_)));
    }

    #[test]
    fn non_string_field_rejected() {
        let mut record = valid_record();
        record["timestamp"] = json!(1700000000);
        let err = check_attestation(&record.to_string()).unwrap_err();
        assert!(matches!(err, AttestationError::SchemaViolation(_)));
    }

    #[test]
    fn non_json_input_is_parse_error() {
        let err = check_attestation("not json").unwrap_err();
        assert!(matches!(err, AttestationError::Parse(_)));
    }
}
