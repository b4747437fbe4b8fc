//! # Risk Classification
//!
//! Deterministic risk tagging for tool calls. The goal is predictability
//! and auditability, not cleverness: every axis is a lookup table or a
//! substring check, and the overall risk is the lattice join of the four
//! axes.
//!
//! ```text
//! risk = max(tool_base, arg_risk, egress_risk, scope_risk)
//! ```

use crate::call::ToolCall;
use crate::lattice::Risk;

/// Substrings in an `exec` command that indicate network reach or
/// deletion. Matched case-insensitively against the flattened command.
const NETWORK_COMMAND_HINTS: [&str; 5] = ["curl ", "wget ", "invoke-webrequest", "scp ", "ssh "];
const DELETION_COMMAND_HINTS: [&str; 5] = ["rm ", "rmdir", "del ", "format", ":(){"];

/// Path fragments that suggest credential or secret material.
const SENSITIVE_PATH_HINTS: [&str; 7] = [
    "appdata",
    ".ssh",
    "id_rsa",
    "id_ed25519",
    "password",
    "secrets",
    "token",
];

/// Compute the risk of a call as the join of all four axes.
pub fn classify_risk(call: &ToolCall) -> Risk {
    tool_base_risk(&call.tool)
        .join(arg_risk(call))
        .join(egress_risk(&call.tool))
        .join(scope_risk(call))
}

/// Per-tool baseline risk. Unknown tools default to `medium`; the
/// `nodes.` namespace (sensors, cameras, screen capture) is uniformly
/// `high`.
fn tool_base_risk(tool: &str) -> Risk {
    match tool {
        // messaging / external effect
        "message.send" => Risk::High,
        "message.broadcast" => Risk::Critical,

        // filesystem
        "read" => Risk::Medium,
        "write" | "edit" => Risk::High,

        // execution
        "exec" => Risk::Critical,

        // web
        "web_fetch" | "browser.navigate" => Risk::Medium,
        "browser.upload" => Risk::High,

        _ if tool.starts_with("nodes.") => Risk::High,
        _ => Risk::Medium,
    }
}

/// Risk contributed by the arguments themselves.
fn arg_risk(call: &ToolCall) -> Risk {
    match call.tool.as_str() {
        "exec" => {
            let cmd = call.command_string().to_lowercase();
            let dangerous = NETWORK_COMMAND_HINTS
                .iter()
                .chain(DELETION_COMMAND_HINTS.iter())
                .any(|hint| cmd.contains(hint));
            if dangerous {
                Risk::Critical
            } else {
                Risk::High
            }
        }
        "read" | "write" | "edit" => match call.path_arg() {
            Some(path) => {
                let path = path.to_lowercase();
                if SENSITIVE_PATH_HINTS.iter().any(|h| path.contains(h)) {
                    Risk::High
                } else {
                    Risk::Medium
                }
            }
            None => Risk::Medium,
        },
        "message.send" | "message.broadcast" => Risk::High,
        _ => Risk::Low,
    }
}

/// Anything that can move data outward is riskier.
fn egress_risk(tool: &str) -> Risk {
    match tool {
        "message.send" | "message.broadcast" | "browser.upload" => Risk::High,
        "web_fetch" => Risk::Medium,
        _ => Risk::Low,
    }
}

/// Risk contributed by the intent context: absent intent keeps the call
/// at `medium`, and only an explicit confirmation lowers this axis.
fn scope_risk(call: &ToolCall) -> Risk {
    match &call.intent {
        None => Risk::Medium,
        Some(_) if call.intent_flag("explicit_confirmation") == Some(true) => Risk::Low,
        Some(_) => Risk::Medium,
    }
}
