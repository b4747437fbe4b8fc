//! # Classification Tagging
//!
//! Reproducible classification tags for tool calls — no learned judgment,
//! only pattern tables. Tags feed rule predicates
//! (`when.classification_any_of`) and the audit record; the `details`
//! mapping is audit-only and never affects the decision.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::call::ToolCall;
use crate::constitution::Constitution;
use crate::lattice::Risk;
use crate::risk::classify_risk;

/// A discrete classification tag.
///
/// Variants are declared in the alphabetical order of their wire names,
/// so the derived `Ord` sorts tag sets exactly as their serialized forms
/// sort.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Derived tag: the call matches a constitutional prohibition.
    ConstitutionallyProhibited,
    /// Destructive command with financial consequence.
    HarmFinancial,
    /// Physical-harm pattern (reserved; no current matcher emits it).
    HarmPhysical,
    /// Message aimed at damaging someone's reputation.
    HarmReputational,
    /// The call was not explicitly requested by the user.
    HiddenAction,
    /// Identity claim without an AI disclosure.
    Impersonation,
    /// Egress to a domain outside the allowlist.
    UnauthorizedEgress,
    /// File access outside the declared workspace.
    UnauthorizedFileAccess,
}

impl Classification {
    /// The snake_case wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::ConstitutionallyProhibited => "constitutionally_prohibited",
            Classification::HarmFinancial => "harm_financial",
            Classification::HarmPhysical => "harm_physical",
            Classification::HarmReputational => "harm_reputational",
            Classification::HiddenAction => "hidden_action",
            Classification::Impersonation => "impersonation",
            Classification::UnauthorizedEgress => "unauthorized_egress",
            Classification::UnauthorizedFileAccess => "unauthorized_file_access",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags that imply [`Classification::ConstitutionallyProhibited`].
const PROHIBITED_TRIGGERS: [Classification; 4] = [
    Classification::Impersonation,
    Classification::HarmFinancial,
    Classification::HarmPhysical,
    Classification::HarmReputational,
];

/// Audit context captured during classification. Never affects the
/// decision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditDetails {
    /// File path the call targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Domains extracted from URL arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    /// The allowlist the domains were checked against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowlist_domains: Option<Vec<String>>,
    /// Outbound message length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_len: Option<usize>,
    /// Flattened exec command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// The classifier's output: risk, tag set, and audit details.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    /// Lattice-valued risk for the call.
    pub risk: Risk,
    /// Classification tags, ordered by wire name.
    pub tags: BTreeSet<Classification>,
    /// Audit-only context.
    pub details: AuditDetails,
}

impl Classified {
    /// The tag set as sorted wire-name strings.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.as_str().to_string()).collect()
    }
}

/// Identity-claim patterns. Case-sensitive on purpose: the claimed NAME
/// must be capitalized.
static IDENTITY_CLAIMS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\bthis is\s+([A-Z][a-z]+)\b").expect("static pattern"),
        Regex::new(r"\bi am\s+([A-Z][a-z]+)\b").expect("static pattern"),
        Regex::new(r"\bfrom\s+([A-Z][a-z]+)\b").expect("static pattern"),
    ]
});

/// AI-disclosure token, word-bounded and case-insensitive.
pub(crate) static AI_DISCLOSURE_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ai|assistant|bot)\b").expect("static pattern"));

/// Reputational-harm vocabulary.
static REPUTATIONAL_HARM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(defame|ruin|expose|leak|doxx)\b").expect("static pattern"));

/// Destructive command shapes with financial consequence.
static DESTRUCTIVE_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(rm\s+-rf|del\s+/s|format\b)\b").expect("static pattern"));

/// Scheme-qualified URL; capture group 1 is the host (with optional
/// port).
static URL_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://([^/]+)").expect("static pattern"));

/// Whether a domain is authorized by an allowlist: exact match or
/// subdomain of an entry. Entries are expected lowercased.
pub fn domain_authorized(domain: &str, allowlist: &[String]) -> bool {
    allowlist
        .iter()
        .any(|entry| domain == entry || domain.ends_with(&format!(".{entry}")))
}

fn extract_domains(call: &ToolCall) -> Vec<String> {
    let mut domains = Vec::new();
    let mut push_host = |url: &str| {
        if let Some(caps) = URL_HOST.captures(url.trim()) {
            if let Some(host) = caps.get(1) {
                domains.push(host.as_str().to_lowercase());
            }
        }
    };

    if call.tool == "web_fetch" {
        if let Some(url) = call.arg_str("url") {
            push_host(url);
        }
    }

    if call.tool.starts_with("browser.") {
        if let Some(url) = call.arg_str("targetUrl").or_else(|| call.arg_str("url")) {
            push_host(url);
        }
    }

    domains
}

fn is_messaging(tool: &str) -> bool {
    matches!(tool, "message.send" | "message.broadcast")
}

fn is_file_tool(tool: &str) -> bool {
    matches!(tool, "read" | "write" | "edit")
}

/// Classify a call: compute risk, emit tags, and capture audit details.
///
/// The constitution contributes only its egress allowlist; without one
/// (or with an empty allowlist) no egress tag is ever emitted.
pub fn classify(call: &ToolCall, constitution: Option<&Constitution>) -> Classified {
    let mut tags = BTreeSet::new();
    let mut details = AuditDetails::default();

    let risk = classify_risk(call);

    // Hidden action: the caller explicitly recorded that the user did
    // not ask for this.
    if call.intent_flag("user_requested") == Some(false) {
        tags.insert(Classification::HiddenAction);
    }

    // Workspace containment for file tools.
    if is_file_tool(&call.tool) {
        if let Some(path) = call.path_arg() {
            details.path = Some(path.to_string());
            if let Some(workspace) = call.intent_str("workspace") {
                if !path.to_lowercase().starts_with(&workspace.to_lowercase()) {
                    tags.insert(Classification::UnauthorizedFileAccess);
                }
            }
        }
    }

    // Egress allowlist for domain-scoped tools.
    let allowlist = constitution
        .map(|c| c.egress.allowlist_domains.as_slice())
        .unwrap_or(&[]);
    let domains = extract_domains(call);
    if !domains.is_empty() {
        details.domains = Some(domains.clone());
        if !allowlist.is_empty() {
            details.allowlist_domains = Some(allowlist.to_vec());
            if domains.iter().any(|d| !domain_authorized(d, allowlist)) {
                tags.insert(Classification::UnauthorizedEgress);
            }
        }
    }

    // Messaging deception heuristics.
    if is_messaging(&call.tool) {
        let message = call.message_string();
        if !message.is_empty() {
            details.message_len = Some(message.chars().count());

            let claims_identity = IDENTITY_CLAIMS.iter().any(|p| p.is_match(&message));
            let has_disclosure = AI_DISCLOSURE_HINT.is_match(&message);
            if claims_identity && !has_disclosure {
                tags.insert(Classification::Impersonation);
            }

            if REPUTATIONAL_HARM.is_match(&message) {
                tags.insert(Classification::HarmReputational);
            }
        }
    }

    // Destructive exec heuristics.
    if call.tool == "exec" {
        let cmd = call.command_string();
        details.command = Some(cmd.clone());
        if DESTRUCTIVE_COMMAND.is_match(&cmd) {
            tags.insert(Classification::HarmFinancial);
        }
    }

    // Certain tags are constitutional prohibitions in themselves.
    if PROHIBITED_TRIGGERS.iter().any(|t| tags.contains(t)) {
        tags.insert(Classification::ConstitutionallyProhibited);
    }

    Classified {
        risk,
        tags,
        details,
    }
}
