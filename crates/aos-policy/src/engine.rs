//! # Two-Pass Rule Engine
//!
//! Evaluates the ordered rule list twice. Pass 1 runs with the baseline
//! decision; pass 2 re-runs with pass 1's decision visible so rules that
//! match on `when.decision` (e.g. "if the computed decision is confirm,
//! require a human-override receipt") can fire. Under the monotone
//! lattice two passes reach the fixed point: `when.decision` is the only
//! backward reference.
//!
//! Obligations from both passes deep-merge: right side wins per leaf,
//! mappings recurse, sequences replace.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::call::ToolCall;
use crate::classify::Classification;
use crate::constitution::Constitution;
use crate::lattice::{Decision, Risk};

/// The caller-supplied `${VAR}` substitution environment.
pub type SubstitutionEnv = BTreeMap<String, String>;

/// Outcome of a single pass over the rule list.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    /// Running decision after the pass.
    pub decision: Decision,
    /// Obligations accumulated by the pass.
    pub obligations: Map<String, Value>,
    /// Ids of rules whose `when` matched, in document order.
    pub matched: Vec<String>,
    /// Rule id responsible for the pass's decision level, if any rule
    /// raised it to `confirm` or `deny`.
    pub reason_code: Option<String>,
}

/// Combined outcome of both passes.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutcome {
    /// `max` of the two pass decisions.
    pub decision: Decision,
    /// Deep merge of both passes' obligations.
    pub obligations: Map<String, Value>,
    /// Sorted, deduplicated union of matched rule ids.
    pub matched_rules: Vec<String>,
    /// Pass 1's reason code, falling back to pass 2's.
    pub reason_code: Option<String>,
}

/// Deep-merge `src` into `dst`.
///
/// Keys in `src` override keys in `dst`; where both sides bind a key to a
/// mapping, the merge recurses. Everything else — including sequences —
/// is replaced, not concatenated.
pub fn deep_merge(dst: &mut Map<String, Value>, src: &Map<String, Value>) {
    for (key, incoming) in src {
        match (dst.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(overlay)) => {
                deep_merge(existing, overlay);
            }
            _ => {
                dst.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Expand `${NAME}` tokens from the substitution environment. Undefined
/// variables leave the token literal.
fn expand_vars(template: &str, env: &SubstitutionEnv) -> String {
    let mut out = template.to_string();
    for (name, value) in env {
        out = out.replace(&format!("${{{name}}}"), value);
    }
    out
}

/// Whether a path starts (case-insensitively) with any of the expanded
/// prefixes. A missing path never matches.
fn path_prefix_any(path: Option<&str>, prefixes: &[String], env: &SubstitutionEnv) -> bool {
    let Some(path) = path else {
        return false;
    };
    let path = path.to_lowercase();
    prefixes
        .iter()
        .any(|prefix| path.starts_with(&expand_vars(prefix, env).to_lowercase()))
}

/// Tracks which rule fixed the reason code, and at which lattice level.
///
/// The reason code names the first rule (in document order) whose
/// contribution set the running decision to `confirm` or `deny` at its
/// final level: a later rule that raises the decision above the recorded
/// level takes over the code; equal-or-lower contributions never
/// overwrite it.
#[derive(Debug, Default)]
struct ReasonTracker {
    code: Option<String>,
    level: Option<Decision>,
}

impl ReasonTracker {
    fn observe(&mut self, rule_id: &str, contribution: Decision, raised_to: Decision) {
        if contribution < Decision::Confirm || contribution < raised_to {
            // Allow contributions never carry a reason; a contribution
            // below the running decision did not set it.
            return;
        }
        let replaces = match self.level {
            None => true,
            Some(level) => raised_to > level,
        };
        if replaces {
            self.code = Some(rule_id.to_string());
            self.level = Some(raised_to);
        }
    }
}

/// One ordered sweep over the rule list.
pub fn run_pass(
    constitution: &Constitution,
    call: &ToolCall,
    risk: Risk,
    classifications: &BTreeSet<Classification>,
    start: Decision,
    env: &SubstitutionEnv,
) -> PassOutcome {
    let mut decision = start;
    let mut obligations = Map::new();
    let mut matched = Vec::new();
    let mut reason = ReasonTracker::default();

    for rule in &constitution.rules {
        if !rule
            .when
            .matches(&call.tool, risk, classifications, decision)
        {
            continue;
        }

        matched.push(rule.id.clone());

        // Conditional exemption: a failed path condition contributes
        // `otherwise` and skips the rule's obligations and action.
        if let Some(allow_if) = &rule.allow_if {
            if let Some(prefixes) = &allow_if.path_prefix_any {
                if !path_prefix_any(call.path_arg(), prefixes, env) {
                    decision = decision.join(rule.otherwise);
                    reason.observe(&rule.id, rule.otherwise, decision);
                    continue;
                }
            }
            // allow_if clauses without a recognized condition are
            // always satisfied.
        }

        if let Some(require) = &rule.require {
            deep_merge(&mut obligations, require);
        }

        if let Some(overrides) = &rule.allow_override {
            let mut wrapper = Map::new();
            wrapper.insert(
                "allow_override".to_string(),
                Value::Object(overrides.clone()),
            );
            deep_merge(&mut obligations, &wrapper);
        }

        decision = decision.join(rule.action);
        reason.observe(&rule.id, rule.action, decision);
    }

    PassOutcome {
        decision,
        obligations,
        matched,
        reason_code: reason.code,
    }
}

/// Run both passes and merge their outcomes.
pub fn evaluate_rules(
    constitution: &Constitution,
    call: &ToolCall,
    risk: Risk,
    classifications: &BTreeSet<Classification>,
    baseline: Decision,
    env: &SubstitutionEnv,
) -> EngineOutcome {
    let pass1 = run_pass(constitution, call, risk, classifications, baseline, env);
    let pass2 = run_pass(
        constitution,
        call,
        risk,
        classifications,
        pass1.decision,
        env,
    );

    let decision = pass1.decision.join(pass2.decision);

    let mut obligations = pass1.obligations;
    deep_merge(&mut obligations, &pass2.obligations);

    let matched: BTreeSet<String> = pass1
        .matched
        .into_iter()
        .chain(pass2.matched)
        .collect();

    EngineOutcome {
        decision,
        obligations,
        matched_rules: matched.into_iter().collect(),
        reason_code: pass1.reason_code.or(pass2.reason_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env() -> SubstitutionEnv {
        SubstitutionEnv::new()
    }

    fn call(tool: &str, args: Value) -> ToolCall {
        ToolCall::new(tool, args.as_object().cloned().unwrap_or_default())
    }

    fn constitution(yaml: &str) -> Constitution {
        Constitution::from_yaml_str(yaml).unwrap()
    }

    fn run(
        c: &Constitution,
        call: &ToolCall,
        risk: Risk,
        tags: &BTreeSet<Classification>,
    ) -> EngineOutcome {
        evaluate_rules(c, call, risk, tags, c.baseline(), &env())
    }

    #[test]
    fn empty_rule_list_keeps_baseline() {
        let c = constitution("defaults: {tool_policy: allow}\n");
        let out = run(&c, &call("read", json!({})), Risk::Low, &BTreeSet::new());
        assert_eq!(out.decision, Decision::Allow);
        assert!(out.obligations.is_empty());
        assert!(out.matched_rules.is_empty());
        assert_eq!(out.reason_code, None);
    }

    #[test]
    fn deny_rule_raises_and_fixes_reason() {
        let c = constitution(
            "defaults: {tool_policy: allow}\nrules:\n  - id: no-exec\n    when: {tool: exec}\n    action: deny\n",
        );
        let out = run(&c, &call("exec", json!({})), Risk::Critical, &BTreeSet::new());
        assert_eq!(out.decision, Decision::Deny);
        assert_eq!(out.reason_code.as_deref(), Some("no-exec"));
        assert_eq!(out.matched_rules, vec!["no-exec"]);
    }

    #[test]
    fn reason_goes_to_rule_that_set_final_level() {
        // First rule confirms, second denies: the deny rule owns the
        // reason because it set the decision at its final level.
        let c = constitution(
            "defaults: {tool_policy: allow}\nrules:\n  - id: soften\n    action: confirm\n  - id: harden\n    action: deny\n",
        );
        let out = run(&c, &call("read", json!({})), Risk::Low, &BTreeSet::new());
        assert_eq!(out.decision, Decision::Deny);
        assert_eq!(out.reason_code.as_deref(), Some("harden"));
    }

    #[test]
    fn equal_contribution_keeps_earlier_reason() {
        let c = constitution(
            "defaults: {tool_policy: allow}\nrules:\n  - id: first-deny\n    action: deny\n  - id: second-deny\n    action: deny\n",
        );
        let out = run(&c, &call("read", json!({})), Risk::Low, &BTreeSet::new());
        assert_eq!(out.reason_code.as_deref(), Some("first-deny"));
    }

    #[test]
    fn allow_contributions_carry_no_reason() {
        let c = constitution(
            "defaults: {tool_policy: confirm}\nrules:\n  - id: blessing\n    action: allow\n",
        );
        let out = run(&c, &call("read", json!({})), Risk::Low, &BTreeSet::new());
        assert_eq!(out.decision, Decision::Confirm);
        assert_eq!(out.reason_code, None);
    }

    #[test]
    fn when_decision_rule_fires_on_second_pass() {
        let c = constitution(
            r#"
defaults: {tool_policy: allow}
rules:
  - id: confirm-writes
    when: {tool: write}
    action: confirm
  - id: receipt-on-confirm
    when: {decision: confirm}
    require:
      human_override: {receipt: required}
"#,
        );
        let out = run(&c, &call("write", json!({})), Risk::High, &BTreeSet::new());
        assert_eq!(out.decision, Decision::Confirm);
        assert_eq!(
            out.obligations["human_override"],
            json!({"receipt": "required"})
        );
        assert_eq!(
            out.matched_rules,
            vec!["confirm-writes", "receipt-on-confirm"]
        );
    }

    #[test]
    fn allow_if_failure_contributes_otherwise_and_skips_obligations() {
        let c = constitution(
            r#"
defaults: {tool_policy: allow}
rules:
  - id: workspace-only
    when: {tool: write}
    allow_if:
      path_prefix_any: ["${WORKSPACE}/"]
    otherwise: {action: deny}
    require:
      audit: {trail: full}
"#,
        );
        let mut env = SubstitutionEnv::new();
        env.insert("WORKSPACE".to_string(), "/home/u/project".to_string());

        let inside = call("write", json!({"path": "/home/u/project/src/main.rs"}));
        let tags = BTreeSet::new();
        let out = evaluate_rules(&c, &inside, Risk::High, &tags, c.baseline(), &env);
        assert_eq!(out.decision, Decision::Allow);
        assert_eq!(out.obligations["audit"], json!({"trail": "full"}));

        let outside = call("write", json!({"path": "/etc/hosts"}));
        let out = evaluate_rules(&c, &outside, Risk::High, &tags, c.baseline(), &env);
        assert_eq!(out.decision, Decision::Deny);
        assert_eq!(out.reason_code.as_deref(), Some("workspace-only"));
        assert!(out.obligations.is_empty());
    }

    #[test]
    fn allow_if_prefix_match_is_case_insensitive() {
        let c = constitution(
            r#"
rules:
  - id: workspace-only
    when: {tool: read}
    allow_if:
      path_prefix_any: ["C:\\Work\\"]
    otherwise: {action: deny}
    action: allow
"#,
        );
        let inside = call("read", json!({"path": "c:\\work\\Notes.txt"}));
        let out = run(&c, &inside, Risk::Medium, &BTreeSet::new());
        assert_eq!(out.decision, Decision::Confirm); // baseline confirm, allow cannot lower
        assert_ne!(out.reason_code.as_deref(), Some("workspace-only"));
    }

    #[test]
    fn undefined_env_var_leaves_token_literal() {
        let c = constitution(
            r#"
rules:
  - id: workspace-only
    when: {tool: read}
    allow_if:
      path_prefix_any: ["${WORKSPACE}/"]
    otherwise: {action: deny}
"#,
        );
        // No WORKSPACE in env: the literal "${workspace}/" prefix cannot
        // match a real path, so the exemption fails.
        let out = run(
            &c,
            &call("read", json!({"path": "/home/u/project/a.txt"})),
            Risk::Medium,
            &BTreeSet::new(),
        );
        assert_eq!(out.decision, Decision::Deny);
    }

    #[test]
    fn allow_if_without_recognized_condition_is_satisfied() {
        let c = constitution(
            r#"
rules:
  - id: future-gate
    when: {tool: read}
    allow_if:
      signed_manifest: required
    require:
      audit: {trail: basic}
    action: allow
"#,
        );
        let out = run(&c, &call("read", json!({})), Risk::Medium, &BTreeSet::new());
        assert_eq!(out.obligations["audit"], json!({"trail": "basic"}));
    }

    #[test]
    fn obligations_deep_merge_across_rules() {
        let c = constitution(
            r#"
rules:
  - id: a
    require:
      disclosure: {mode: append_if_missing, text: " — AI"}
  - id: b
    require:
      disclosure: {mode: always}
      logging: {level: info}
"#,
        );
        let out = run(&c, &call("read", json!({})), Risk::Low, &BTreeSet::new());
        // Later rule wins the colliding leaf; sibling leaves survive.
        assert_eq!(
            out.obligations["disclosure"],
            json!({"mode": "always", "text": " — AI"})
        );
        assert_eq!(out.obligations["logging"], json!({"level": "info"}));
    }

    #[test]
    fn sequences_replace_on_merge() {
        let mut dst = json!({"xs": [1, 2, 3]}).as_object().cloned().unwrap();
        let src = json!({"xs": [9]}).as_object().cloned().unwrap();
        deep_merge(&mut dst, &src);
        assert_eq!(dst["xs"], json!([9]));
    }

    #[test]
    fn allow_override_nests_under_its_key() {
        let c = constitution(
            r#"
rules:
  - id: override-channel
    allow_override:
      human: {role: operator}
"#,
        );
        let out = run(&c, &call("read", json!({})), Risk::Low, &BTreeSet::new());
        assert_eq!(
            out.obligations["allow_override"],
            json!({"human": {"role": "operator"}})
        );
    }

    #[test]
    fn matched_rules_are_sorted_unique_across_passes() {
        let c = constitution(
            r#"
defaults: {tool_policy: allow}
rules:
  - id: z-rule
    action: confirm
  - id: a-rule
    when: {decision: confirm}
    action: confirm
"#,
        );
        let out = run(&c, &call("read", json!({})), Risk::Low, &BTreeSet::new());
        // z-rule matches both passes, a-rule only the second; the union
        // is sorted and deduplicated.
        assert_eq!(out.matched_rules, vec!["a-rule", "z-rule"]);
    }

    #[test]
    fn classification_predicate_gates_rule() {
        let c = constitution(
            r#"
defaults: {tool_policy: allow}
rules:
  - id: deny-prohibited
    when: {classification_any_of: [constitutionally_prohibited]}
    action: deny
"#,
        );
        let mut tags = BTreeSet::new();
        tags.insert(Classification::ConstitutionallyProhibited);
        let out = run(&c, &call("exec", json!({})), Risk::Critical, &tags);
        assert_eq!(out.decision, Decision::Deny);

        let out = run(&c, &call("exec", json!({})), Risk::Critical, &BTreeSet::new());
        assert_eq!(out.decision, Decision::Allow);
    }
}
