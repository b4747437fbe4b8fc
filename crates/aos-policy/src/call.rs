//! # Tool Call Model
//!
//! The evaluator's view of one proposed tool invocation. `args` and
//! `intent` stay loosely-typed JSON mappings at the boundary — their
//! shapes belong to the tools, not to the policy engine — with typed
//! accessors for the keys the classifiers recognize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A proposed tool invocation under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name, e.g. `message.send` or `exec`.
    pub tool: String,
    /// Tool arguments as the agent proposed them.
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Which session proposed the call. Defaults to `main`.
    #[serde(default = "default_session_kind")]
    pub session_kind: String,
    /// Caller-asserted intent context, when the Gateway has one.
    #[serde(default)]
    pub intent: Option<Map<String, Value>>,
}

fn default_session_kind() -> String {
    "main".to_string()
}

impl ToolCall {
    /// Build a call with default session kind and no intent.
    pub fn new(tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            args,
            session_kind: default_session_kind(),
            intent: None,
        }
    }

    /// Attach an intent mapping.
    pub fn with_intent(mut self, intent: Map<String, Value>) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Override the session kind.
    pub fn with_session_kind(mut self, kind: impl Into<String>) -> Self {
        self.session_kind = kind.into();
        self
    }

    /// A string argument by key, if present and actually a string.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    /// The file path argument: `path`, falling back to `file_path`.
    pub fn path_arg(&self) -> Option<&str> {
        self.arg_str("path").or_else(|| self.arg_str("file_path"))
    }

    /// A boolean intent flag by key, if intent is present and the value
    /// is an actual boolean.
    pub fn intent_flag(&self, key: &str) -> Option<bool> {
        self.intent.as_ref()?.get(key)?.as_bool()
    }

    /// A string intent value by key.
    pub fn intent_str(&self, key: &str) -> Option<&str> {
        self.intent.as_ref()?.get(key)?.as_str()
    }

    /// The `command` argument flattened to one string: sequences are
    /// joined with single spaces, scalars are rendered directly, and a
    /// missing or null command is empty.
    pub fn command_string(&self) -> String {
        match self.args.get("command") {
            Some(Value::Array(items)) => items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(" "),
            Some(Value::Null) | None => String::new(),
            Some(other) => scalar_text(other),
        }
    }

    /// The `message` argument as text; non-string scalars are rendered,
    /// anything absent or null is empty.
    pub fn message_string(&self) -> String {
        match self.args.get("message") {
            Some(Value::Null) | None => String::new(),
            Some(other) => scalar_text(other),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn defaults_apply_on_deserialize() {
        let call: ToolCall = serde_json::from_value(json!({"tool": "read"})).unwrap();
        assert_eq!(call.session_kind, "main");
        assert!(call.args.is_empty());
        assert!(call.intent.is_none());
    }

    #[test]
    fn path_falls_back_to_file_path() {
        let call = ToolCall::new("edit", args(json!({"file_path": "/tmp/x"})));
        assert_eq!(call.path_arg(), Some("/tmp/x"));
        let call = ToolCall::new("edit", args(json!({"path": "/a", "file_path": "/b"})));
        assert_eq!(call.path_arg(), Some("/a"));
    }

    #[test]
    fn command_string_joins_sequences() {
        let call = ToolCall::new("exec", args(json!({"command": ["rm", "-rf", "/"]})));
        assert_eq!(call.command_string(), "rm -rf /");
    }

    #[test]
    fn command_string_renders_scalars() {
        let call = ToolCall::new("exec", args(json!({"command": "ls -la"})));
        assert_eq!(call.command_string(), "ls -la");
        let call = ToolCall::new("exec", args(json!({})));
        assert_eq!(call.command_string(), "");
    }

    #[test]
    fn intent_accessors_require_real_types() {
        let call = ToolCall::new("read", Map::new()).with_intent(
            args(json!({"user_requested": false, "workspace": "/home/u/p", "explicit_confirmation": "yes"})),
        );
        assert_eq!(call.intent_flag("user_requested"), Some(false));
        assert_eq!(call.intent_str("workspace"), Some("/home/u/p"));
        // A string is not a boolean flag.
        assert_eq!(call.intent_flag("explicit_confirmation"), None);
    }
}
