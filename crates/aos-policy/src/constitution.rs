//! # Constitution Data Model
//!
//! The policy document: baseline decision, egress allowlist, and an
//! ordered rule list. Loading is two-stage — a loose serde layer accepts
//! the YAML (unknown fields and unknown `when` predicates are ignored for
//! forward compatibility), then a validation pass produces typed
//! structures. A value that parses but is not in the schema's vocabulary
//! — an unknown `action`, an unknown risk level — fails with
//! [`ConstitutionError::SchemaViolation`] at load time, so evaluation
//! itself never has to fail.
//!
//! The embedded `doc_hash` is carried verbatim as an opaque string; it is
//! never recomputed here.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::classify::Classification;
use crate::error::ConstitutionError;
use crate::lattice::{Decision, Risk};

/// A validated, immutable constitution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constitution {
    /// Baseline policy applied before any rule runs.
    pub defaults: Defaults,
    /// Egress domain allowlist.
    pub egress: EgressPolicy,
    /// Ordered rule list. Order matters only for reason-code
    /// tie-breaking and per-leaf obligation collisions.
    pub rules: Vec<Rule>,
    /// The document's embedded self-hash, kept opaque for scope hashing.
    pub doc_hash: Option<String>,
}

/// Baseline decisions applied before rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Defaults {
    /// Baseline decision for every tool call; `confirm` when absent.
    pub tool_policy: Option<Decision>,
}

/// Egress policy: which domains the agent may reach.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EgressPolicy {
    /// Lowercased allowlist entries. A domain is authorized when it
    /// equals an entry or is a subdomain of one.
    pub allowlist_domains: Vec<String>,
}

/// One policy rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Rule identifier, used as the reason code.
    pub id: String,
    /// Match predicate. An empty clause matches every call.
    pub when: WhenClause,
    /// Decision contributed when the rule applies.
    pub action: Decision,
    /// Conditional exemption; when its condition fails, `otherwise`
    /// applies instead of `action` and obligations are skipped.
    pub allow_if: Option<AllowIf>,
    /// Decision contributed when `allow_if` is present but fails.
    pub otherwise: Decision,
    /// Obligations deep-merged into the result when the rule applies.
    pub require: Option<Map<String, Value>>,
    /// Mapping merged verbatim under `obligations.allow_override`.
    pub allow_override: Option<Map<String, Value>>,
}

/// Rule match predicate. Present predicates AND together; absence is a
/// wildcard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhenClause {
    /// Exact tool name, or `*` for any tool.
    pub tool: Option<String>,
    /// Any-of tool name list.
    pub tool_any_of: Option<Vec<String>>,
    /// Minimum risk level.
    pub risk_at_least: Option<Risk>,
    /// At least one of these classification tags must be present.
    pub classification_any_of: Option<Vec<String>>,
    /// The running decision must equal this value. Satisfied on pass 2
    /// once pass 1 has raised the decision.
    pub decision: Option<Decision>,
}

/// Conditional exemption clause. Fields other than `path_prefix_any` are
/// treated as always satisfied.
#[derive(Debug, Clone, PartialEq)]
pub struct AllowIf {
    /// Path prefixes (after `${VAR}` expansion) that exempt the call.
    pub path_prefix_any: Option<Vec<String>>,
}

impl WhenClause {
    /// Whether every present predicate holds.
    pub fn matches(
        &self,
        tool: &str,
        risk: Risk,
        classifications: &BTreeSet<Classification>,
        decision: Decision,
    ) -> bool {
        if let Some(want) = &self.tool {
            if want != "*" && want != tool {
                return false;
            }
        }
        if let Some(any) = &self.tool_any_of {
            if !any.iter().any(|t| t == tool) {
                return false;
            }
        }
        if let Some(min) = self.risk_at_least {
            if !risk.at_least(min) {
                return false;
            }
        }
        if let Some(wanted) = &self.classification_any_of {
            let hit = wanted
                .iter()
                .any(|w| classifications.iter().any(|c| c.as_str() == w));
            if !hit {
                return false;
            }
        }
        if let Some(want) = self.decision {
            if want != decision {
                return false;
            }
        }
        true
    }
}

impl Constitution {
    /// An empty constitution: baseline `confirm`, no allowlist, no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and validate a constitution from YAML text.
    ///
    /// An empty document (or explicit `null`) yields
    /// [`Constitution::empty()`].
    pub fn from_yaml_str(text: &str) -> Result<Self, ConstitutionError> {
        let value = aos_core::yaml_to_value(text)?;
        Self::from_value(value)
    }

    /// Validate a constitution from an already-parsed JSON value tree.
    pub fn from_value(value: Value) -> Result<Self, ConstitutionError> {
        if value.is_null() {
            return Ok(Self::empty());
        }
        let raw: RawConstitution =
            serde_json::from_value(value).map_err(aos_core::ParseError::Json)?;
        raw.validate()
    }

    /// The defaulted baseline decision (`confirm` when unspecified).
    pub fn baseline(&self) -> Decision {
        self.defaults.tool_policy.unwrap_or(Decision::Confirm)
    }
}

// ---------------------------------------------------------------------------
// Raw serde layer
// ---------------------------------------------------------------------------

// Every section is `Option` rather than `#[serde(default)]` alone: a
// hand-edited document often leaves a key with an explicit null
// (`rules:` on its own line), which must read the same as an absent key.
#[derive(Debug, Deserialize, Default)]
struct RawConstitution {
    #[serde(default)]
    defaults: Option<RawDefaults>,
    #[serde(default)]
    egress: Option<RawEgress>,
    #[serde(default)]
    rules: Option<Vec<RawRule>>,
    #[serde(default)]
    doc_hash: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawDefaults {
    #[serde(default)]
    tool_policy: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawEgress {
    #[serde(default)]
    allowlist_domains: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct RawRule {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    when: Option<RawWhen>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    allow_if: Option<RawAllowIf>,
    #[serde(default)]
    otherwise: Option<RawOtherwise>,
    #[serde(default)]
    require: Option<Value>,
    #[serde(default)]
    allow_override: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
struct RawWhen {
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    tool_any_of: Option<Vec<String>>,
    #[serde(default)]
    risk_at_least: Option<String>,
    #[serde(default)]
    classification_any_of: Option<Vec<String>>,
    #[serde(default)]
    decision: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAllowIf {
    #[serde(default)]
    path_prefix_any: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct RawOtherwise {
    #[serde(default)]
    action: Option<String>,
}

impl RawConstitution {
    fn validate(self) -> Result<Constitution, ConstitutionError> {
        let tool_policy = self
            .defaults
            .unwrap_or_default()
            .tool_policy
            .map(|s| {
                Decision::parse(&s).ok_or_else(|| {
                    ConstitutionError::SchemaViolation(format!(
                        "unknown defaults.tool_policy: {s}"
                    ))
                })
            })
            .transpose()?;

        let allowlist_domains = self
            .egress
            .unwrap_or_default()
            .allowlist_domains
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.to_lowercase())
            .collect();

        let rules = self
            .rules
            .unwrap_or_default()
            .into_iter()
            .map(RawRule::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Constitution {
            defaults: Defaults { tool_policy },
            egress: EgressPolicy { allowlist_domains },
            rules,
            doc_hash: self.doc_hash,
        })
    }
}

impl RawRule {
    fn validate(self) -> Result<Rule, ConstitutionError> {
        let id = self.id.unwrap_or_default();

        let action = match self.action {
            Some(s) => Decision::parse(&s).ok_or_else(|| {
                ConstitutionError::SchemaViolation(format!(
                    "rule {id:?}: unknown action: {s}"
                ))
            })?,
            None => Decision::Allow,
        };

        let otherwise = match self.otherwise.and_then(|o| o.action) {
            Some(s) => Decision::parse(&s).ok_or_else(|| {
                ConstitutionError::SchemaViolation(format!(
                    "rule {id:?}: unknown otherwise.action: {s}"
                ))
            })?,
            None => Decision::Confirm,
        };

        let when = match self.when {
            Some(raw) => {
                let risk_at_least = raw
                    .risk_at_least
                    .map(|s| {
                        Risk::parse(&s).ok_or_else(|| {
                            ConstitutionError::SchemaViolation(format!(
                                "rule {id:?}: unknown when.risk_at_least: {s}"
                            ))
                        })
                    })
                    .transpose()?;
                let decision = raw
                    .decision
                    .map(|s| {
                        Decision::parse(&s).ok_or_else(|| {
                            ConstitutionError::SchemaViolation(format!(
                                "rule {id:?}: unknown when.decision: {s}"
                            ))
                        })
                    })
                    .transpose()?;
                WhenClause {
                    tool: raw.tool,
                    tool_any_of: raw.tool_any_of,
                    risk_at_least,
                    classification_any_of: raw.classification_any_of,
                    decision,
                }
            }
            None => WhenClause::default(),
        };

        let allow_if = self.allow_if.map(|raw| AllowIf {
            path_prefix_any: raw.path_prefix_any,
        });

        Ok(Rule {
            id,
            when,
            action,
            allow_if,
            otherwise,
            require: as_mapping(self.require),
            allow_override: as_mapping(self.allow_override),
        })
    }
}

/// Obligations must be mappings; anything else is ignored, matching the
/// loose-field tolerance elsewhere in the schema.
fn as_mapping(value: Option<Value>) -> Option<Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_empty_constitution() {
        let c = Constitution::from_yaml_str("").unwrap();
        assert_eq!(c, Constitution::empty());
        assert_eq!(c.baseline(), Decision::Confirm);
    }

    #[test]
    fn explicit_null_sections_read_as_absent() {
        let c = Constitution::from_yaml_str("defaults:\negress:\nrules:\n").unwrap();
        assert_eq!(c, Constitution::empty());
    }

    #[test]
    fn minimal_document_parses() {
        let c = Constitution::from_yaml_str(
            "defaults:\n  tool_policy: allow\ndoc_hash: sha256:abc\n",
        )
        .unwrap();
        assert_eq!(c.baseline(), Decision::Allow);
        assert_eq!(c.doc_hash.as_deref(), Some("sha256:abc"));
    }

    #[test]
    fn allowlist_is_lowercased() {
        let c = Constitution::from_yaml_str(
            "egress:\n  allowlist_domains: [Trusted.Example, other.example]\n",
        )
        .unwrap();
        assert_eq!(
            c.egress.allowlist_domains,
            vec!["trusted.example", "other.example"]
        );
    }

    #[test]
    fn rule_defaults_resolve() {
        let c = Constitution::from_yaml_str("rules:\n  - id: r1\n").unwrap();
        let rule = &c.rules[0];
        assert_eq!(rule.action, Decision::Allow);
        assert_eq!(rule.otherwise, Decision::Confirm);
        assert_eq!(rule.when, WhenClause::default());
    }

    #[test]
    fn unknown_action_is_schema_violation() {
        let err = Constitution::from_yaml_str("rules:\n  - id: r1\n    action: escalate\n")
            .unwrap_err();
        assert!(matches!(err, ConstitutionError::SchemaViolation(_)));
    }

    #[test]
    fn unknown_otherwise_action_is_schema_violation() {
        let err = Constitution::from_yaml_str(
            "rules:\n  - id: r1\n    otherwise:\n      action: escalate\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConstitutionError::SchemaViolation(_)));
    }

    #[test]
    fn unknown_when_risk_is_schema_violation() {
        let err = Constitution::from_yaml_str(
            "rules:\n  - id: r1\n    when:\n      risk_at_least: extreme\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConstitutionError::SchemaViolation(_)));
    }

    #[test]
    fn unknown_when_predicate_is_ignored() {
        let c = Constitution::from_yaml_str(
            "rules:\n  - id: r1\n    when:\n      moon_phase: full\n      tool: exec\n",
        )
        .unwrap();
        assert_eq!(c.rules[0].when.tool.as_deref(), Some("exec"));
    }

    #[test]
    fn unknown_rule_field_is_ignored() {
        let c = Constitution::from_yaml_str(
            "rules:\n  - id: r1\n    severity: cosmetic\n",
        )
        .unwrap();
        assert_eq!(c.rules[0].id, "r1");
    }

    #[test]
    fn allow_if_without_path_prefixes_parses() {
        let c = Constitution::from_yaml_str(
            "rules:\n  - id: r1\n    allow_if:\n      future_condition: x\n",
        )
        .unwrap();
        let allow_if = c.rules[0].allow_if.as_ref().unwrap();
        assert!(allow_if.path_prefix_any.is_none());
    }

    #[test]
    fn non_mapping_require_is_ignored() {
        let c = Constitution::from_yaml_str(
            "rules:\n  - id: r1\n    require: [not, a, mapping]\n",
        )
        .unwrap();
        assert!(c.rules[0].require.is_none());
    }

    #[test]
    fn when_clause_tool_wildcard() {
        let when = WhenClause {
            tool: Some("*".to_string()),
            ..WhenClause::default()
        };
        assert!(when.matches("anything", Risk::Low, &BTreeSet::new(), Decision::Allow));
    }

    #[test]
    fn when_clause_predicates_and_together() {
        let when = WhenClause {
            tool_any_of: Some(vec!["exec".to_string(), "write".to_string()]),
            risk_at_least: Some(Risk::High),
            ..WhenClause::default()
        };
        assert!(when.matches("exec", Risk::Critical, &BTreeSet::new(), Decision::Allow));
        assert!(!when.matches("exec", Risk::Medium, &BTreeSet::new(), Decision::Allow));
        assert!(!when.matches("read", Risk::Critical, &BTreeSet::new(), Decision::Allow));
    }

    #[test]
    fn when_clause_classification_any_of() {
        let mut tags = BTreeSet::new();
        tags.insert(Classification::Impersonation);
        let when = WhenClause {
            classification_any_of: Some(vec![
                "impersonation".to_string(),
                "harm_physical".to_string(),
            ]),
            ..WhenClause::default()
        };
        assert!(when.matches("message.send", Risk::High, &tags, Decision::Allow));
        assert!(!when.matches("message.send", Risk::High, &BTreeSet::new(), Decision::Allow));
    }

    #[test]
    fn when_clause_decision_predicate() {
        let when = WhenClause {
            decision: Some(Decision::Confirm),
            ..WhenClause::default()
        };
        assert!(when.matches("read", Risk::Low, &BTreeSet::new(), Decision::Confirm));
        assert!(!when.matches("read", Risk::Low, &BTreeSet::new(), Decision::Allow));
    }
}
