//! # Disclosure Obligation Helper
//!
//! How a Gateway enforces `obligations.disclosure` on an outbound
//! message. Kept beside the engine so the token list stays in lockstep
//! with the impersonation classifier — a message the classifier accepts
//! as disclosed must also satisfy the obligation.

use serde_json::{Map, Value};

use crate::classify::AI_DISCLOSURE_HINT;
use crate::constitution::Constitution;

/// A disclosure obligation extracted from rule obligations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureObligation {
    /// Enforcement mode. Only `append_if_missing` has behavior; unknown
    /// modes are deliberate no-ops, not errors.
    pub mode: String,
    /// The disclosure text to append.
    pub text: String,
}

/// Apply a disclosure obligation to an outbound message.
///
/// For `append_if_missing`: the message passes unchanged when it already
/// carries an AI-disclosure token (`ai`, `assistant`, `bot`,
/// word-bounded, case-insensitive) or already contains the trimmed
/// disclosure text; otherwise the text is appended. Re-applying the same
/// obligation is therefore a no-op. All other modes return the message
/// unchanged.
pub fn apply_disclosure(message: &str, disclosure: Option<&DisclosureObligation>) -> String {
    let Some(disclosure) = disclosure else {
        return message.to_string();
    };

    if disclosure.mode != "append_if_missing" {
        return message.to_string();
    }

    if AI_DISCLOSURE_HINT.is_match(message) {
        return message.to_string();
    }

    let trimmed = disclosure.text.trim();
    if !trimmed.is_empty() && message.contains(trimmed) {
        return message.to_string();
    }

    format!("{message}{}", disclosure.text)
}

/// Extract a disclosure obligation from a merged obligations mapping
/// (`obligations.disclosure.{mode, text}`).
pub fn disclosure_from_obligations(
    obligations: &Map<String, Value>,
) -> Option<DisclosureObligation> {
    let disclosure = obligations.get("disclosure")?.as_object()?;
    from_mapping(disclosure)
}

/// Extract the first disclosure obligation declared by a constitution's
/// rules, in document order (`rules[*].require.disclosure`).
pub fn disclosure_from_constitution(constitution: &Constitution) -> Option<DisclosureObligation> {
    constitution.rules.iter().find_map(|rule| {
        let require = rule.require.as_ref()?;
        let disclosure = require.get("disclosure")?.as_object()?;
        from_mapping(disclosure)
    })
}

fn from_mapping(disclosure: &Map<String, Value>) -> Option<DisclosureObligation> {
    let mode = disclosure.get("mode")?.as_str()?.to_string();
    let text = disclosure.get("text")?.as_str()?.to_string();
    if mode.is_empty() || text.is_empty() {
        return None;
    }
    Some(DisclosureObligation { mode, text })
}
