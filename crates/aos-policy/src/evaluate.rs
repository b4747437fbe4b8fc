//! # Evaluator Facade
//!
//! Composes the pipeline: classify risk and tags, run the two-pass rule
//! engine from the defaulted baseline, and — for confirmable calls —
//! derive the scope hash that a later human-approval step binds to.
//!
//! Everything here is a pure function of `(constitution, call, env,
//! engine_version)`: the emitted [`EvalResult`] is bytewise identical
//! across runs and platforms.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use aos_core::{sha256_hex, CanonicalBytes};

use crate::call::ToolCall;
use crate::classify::classify;
use crate::constitution::Constitution;
use crate::engine::evaluate_rules;
pub use crate::engine::SubstitutionEnv;
use crate::lattice::{Decision, Risk};

/// Identifies this engine build inside scope hashes. Overridable via
/// [`Evaluator::with_engine_version`].
pub const POLICY_ENGINE_VERSION: &str = "phase1-ref-eval-1";

/// The decision record for one evaluated call.
///
/// Field declaration order is alphabetical so the derived serializer and
/// the canonical encoder agree on key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Classification tags, sorted.
    pub classifications: Vec<String>,
    /// The final decision.
    pub decision: Decision,
    /// Sorted unique ids of rules that matched in either pass.
    pub matched_rules: Vec<String>,
    /// Merged obligations the Gateway must enforce.
    pub obligations: Map<String, Value>,
    /// Rule id responsible for the final decision level, if any.
    pub reason_code: Option<String>,
    /// The computed risk label.
    pub risk: Risk,
    /// Present iff `decision == confirm`.
    pub scope_hash: Option<String>,
}

impl EvalResult {
    /// The result as a JSON value tree with sorted keys throughout.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert(
            "classifications".to_string(),
            Value::Array(
                self.classifications
                    .iter()
                    .map(|t| Value::String(t.clone()))
                    .collect(),
            ),
        );
        out.insert(
            "decision".to_string(),
            Value::String(self.decision.as_str().to_string()),
        );
        out.insert(
            "matched_rules".to_string(),
            Value::Array(
                self.matched_rules
                    .iter()
                    .map(|id| Value::String(id.clone()))
                    .collect(),
            ),
        );
        out.insert(
            "obligations".to_string(),
            Value::Object(self.obligations.clone()),
        );
        out.insert(
            "reason_code".to_string(),
            match &self.reason_code {
                Some(code) => Value::String(code.clone()),
                None => Value::Null,
            },
        );
        out.insert(
            "risk".to_string(),
            Value::String(self.risk.as_str().to_string()),
        );
        out.insert(
            "scope_hash".to_string(),
            match &self.scope_hash {
                Some(hash) => Value::String(hash.clone()),
                None => Value::Null,
            },
        );
        Value::Object(out)
    }

    /// The result as canonical JSON bytes (sorted keys, compact).
    ///
    /// This is the determinism surface: for a fixed input, these bytes
    /// are identical across runs and platforms.
    pub fn to_canonical_json(&self) -> Vec<u8> {
        CanonicalBytes::from_value(&self.to_value()).into_bytes()
    }
}

/// The policy evaluator: an immutable constitution plus an engine
/// version string.
///
/// Evaluations are pure and lock-free; a single `Evaluator` may serve
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct Evaluator {
    constitution: Constitution,
    engine_version: String,
}

impl Evaluator {
    /// Build an evaluator over a constitution with the default engine
    /// version.
    pub fn new(constitution: Constitution) -> Self {
        Self {
            constitution,
            engine_version: POLICY_ENGINE_VERSION.to_string(),
        }
    }

    /// Override the engine version recorded in scope hashes.
    pub fn with_engine_version(mut self, version: impl Into<String>) -> Self {
        self.engine_version = version.into();
        self
    }

    /// The constitution this evaluator reads.
    pub fn constitution(&self) -> &Constitution {
        &self.constitution
    }

    /// Evaluate one proposed tool call.
    ///
    /// Total: every well-formed call yields a result. The substitution
    /// environment feeds `${VAR}` expansion inside `allow_if`
    /// path prefixes.
    pub fn evaluate(&self, call: &ToolCall, env: &SubstitutionEnv) -> EvalResult {
        let classified = classify(call, Some(&self.constitution));
        let baseline = self.constitution.baseline();

        let outcome = evaluate_rules(
            &self.constitution,
            call,
            classified.risk,
            &classified.tags,
            baseline,
            env,
        );

        let scope_hash = if outcome.decision == Decision::Confirm {
            Some(self.scope_hash(call))
        } else {
            None
        };

        EvalResult {
            classifications: classified.tag_names(),
            decision: outcome.decision,
            matched_rules: outcome.matched_rules,
            obligations: outcome.obligations,
            reason_code: outcome.reason_code,
            risk: classified.risk,
            scope_hash,
        }
    }

    /// The scope hash binding a confirm decision to the exact tool,
    /// arguments, and policy version.
    ///
    /// The constitution's own `doc_hash` participates as stored — JSON
    /// `null` when absent, never recomputed — so the hash pins the
    /// policy text the operator believes is in force.
    fn scope_hash(&self, call: &ToolCall) -> String {
        let mut payload = Map::new();
        payload.insert("args".to_string(), Value::Object(call.args.clone()));
        payload.insert(
            "constitution_doc_hash".to_string(),
            match &self.constitution.doc_hash {
                Some(hash) => Value::String(hash.clone()),
                None => Value::Null,
            },
        );
        payload.insert(
            "policy_engine_version".to_string(),
            Value::String(self.engine_version.clone()),
        );
        payload.insert("tool".to_string(), Value::String(call.tool.clone()));
        sha256_hex(&CanonicalBytes::from_value(&Value::Object(payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(tool: &str, args: Value) -> ToolCall {
        ToolCall::new(tool, args.as_object().cloned().unwrap_or_default())
    }

    fn evaluator(yaml: &str) -> Evaluator {
        Evaluator::new(Constitution::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn empty_constitution_confirms_with_empty_obligations() {
        let ev = Evaluator::new(Constitution::empty());
        let result = ev.evaluate(&call("read", json!({})), &SubstitutionEnv::new());
        assert_eq!(result.decision, Decision::Confirm);
        assert!(result.obligations.is_empty());
        assert!(result.scope_hash.is_some());
        assert_eq!(result.reason_code, None);
    }

    #[test]
    fn scope_hash_present_iff_confirm() {
        let ev = evaluator("defaults: {tool_policy: allow}\n");
        let result = ev.evaluate(&call("noop", json!({})), &SubstitutionEnv::new());
        assert_eq!(result.decision, Decision::Allow);
        assert!(result.scope_hash.is_none());

        let ev = evaluator(
            "defaults: {tool_policy: allow}\nrules:\n  - id: hard-no\n    action: deny\n",
        );
        let result = ev.evaluate(&call("noop", json!({})), &SubstitutionEnv::new());
        assert_eq!(result.decision, Decision::Deny);
        assert!(result.scope_hash.is_none());
    }

    #[test]
    fn scope_hash_is_stable_across_runs() {
        let ev = evaluator("doc_hash: sha256:abc\n");
        let c = call("write", json!({"path": "/tmp/x", "content": "hi"}));
        let a = ev.evaluate(&c, &SubstitutionEnv::new());
        let b = ev.evaluate(&c, &SubstitutionEnv::new());
        assert_eq!(a.scope_hash, b.scope_hash);
        assert_eq!(a.to_canonical_json(), b.to_canonical_json());
    }

    #[test]
    fn scope_hash_depends_on_engine_version() {
        let constitution = Constitution::from_yaml_str("doc_hash: sha256:abc\n").unwrap();
        let a = Evaluator::new(constitution.clone())
            .evaluate(&call("read", json!({})), &SubstitutionEnv::new());
        let b = Evaluator::new(constitution)
            .with_engine_version("phase2")
            .evaluate(&call("read", json!({})), &SubstitutionEnv::new());
        assert_ne!(a.scope_hash, b.scope_hash);
    }

    #[test]
    fn scope_hash_uses_stored_doc_hash_not_recomputed() {
        // Two constitutions with identical stored doc_hash but different
        // rule lists produce the same scope hash for the same call,
        // because the stored field — not the document bytes — feeds the
        // hash.
        let a = evaluator("doc_hash: sha256:same\n");
        let b = evaluator(
            "doc_hash: sha256:same\nrules:\n  - id: extra\n    action: confirm\n",
        );
        let c = call("read", json!({"path": "/tmp/x"}));
        let ra = a.evaluate(&c, &SubstitutionEnv::new());
        let rb = b.evaluate(&c, &SubstitutionEnv::new());
        assert_eq!(ra.scope_hash, rb.scope_hash);
    }

    #[test]
    fn canonical_json_has_sorted_keys_and_all_fields() {
        let ev = Evaluator::new(Constitution::empty());
        let result = ev.evaluate(&call("read", json!({})), &SubstitutionEnv::new());
        let text = String::from_utf8(result.to_canonical_json()).unwrap();
        let class_pos = text.find("\"classifications\"").unwrap();
        let decision_pos = text.find("\"decision\"").unwrap();
        let scope_pos = text.find("\"scope_hash\"").unwrap();
        assert!(class_pos < decision_pos && decision_pos < scope_pos);
        assert!(text.contains("\"reason_code\":null"));
    }
}
