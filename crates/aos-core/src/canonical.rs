//! # Canonical Serialization — Deterministic Byte Production
//!
//! This module defines [`CanonicalBytes`], the sole construction path for
//! bytes used in digest computation across the policy stack.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct `CanonicalBytes`
//! is through one of its constructors, each of which produces compact JSON
//! with recursively sorted keys. Document hashing, scope hashing, and
//! signature verification must all accept `&CanonicalBytes`, so the "wrong
//! serialization path" class of defects is structurally impossible.
//!
//! ## Canonical Form
//!
//! - Mapping keys sorted lexicographically as Unicode code points (byte
//!   order of UTF-8), recursively at every level.
//! - Sequences preserved in declared order.
//! - Compact separators: no whitespace after `,` or `:`.
//! - Non-ASCII characters emitted verbatim; strings use JSON escapes only
//!   where JSON requires them (`"`, `\`, control characters).
//! - Numbers, booleans, and null in their JSON form.
//!
//! YAML input that cannot be expressed in JSON — non-string mapping keys,
//! non-finite numbers, tagged nodes — is rejected with [`ParseError`].

use serde::Serialize;
use serde_json::Value;

use crate::error::ParseError;

/// Bytes produced exclusively by sorted-key compact JSON canonicalization.
///
/// The inner `Vec<u8>` is private — downstream code cannot construct
/// `CanonicalBytes` except through the constructors here. This single
/// construction path ensures every digest in the system is computed from
/// properly canonicalized data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the value's `Serialize` impl fails
    /// (e.g. a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, ParseError> {
        let value = serde_json::to_value(obj)?;
        Ok(Self::from_value(&value))
    }

    /// Construct canonical bytes from a JSON value tree.
    ///
    /// Every `serde_json::Value` has a canonical form, so this cannot fail.
    /// Evaluation-time canonicalization (scope hashes, result encoding) uses
    /// this path to stay total.
    pub fn from_value(value: &Value) -> Self {
        let mut out = Vec::new();
        write_canonical(&mut out, value);
        Self(out)
    }

    /// Parse YAML text and construct canonical bytes from it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the YAML is not loadable, uses non-string
    /// mapping keys, contains non-finite numbers, or carries tags.
    pub fn from_yaml_str(text: &str) -> Result<Self, ParseError> {
        let value = yaml_to_value(text)?;
        Ok(Self::from_value(&value))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Return the length of the canonical byte representation.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether the canonical byte representation is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Load YAML text into a JSON value tree.
///
/// Mirrors a safe YAML load: merge keys (`<<`) are applied, aliases are
/// expanded by the parser, and anything canonical JSON cannot express is
/// rejected rather than coerced.
///
/// # Errors
///
/// - [`ParseError::Yaml`] — the text is not valid YAML (including cyclic
///   aliases, which the parser refuses to expand).
/// - [`ParseError::NonStringKey`] — a mapping key is not a string.
/// - [`ParseError::NonFiniteNumber`] — `.nan`, `.inf`, or `-.inf`.
/// - [`ParseError::UnsupportedNode`] — a tagged node.
pub fn yaml_to_value(text: &str) -> Result<Value, ParseError> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(text)?;
    value.apply_merge()?;
    convert_yaml(value)
}

fn convert_yaml(value: serde_yaml::Value) -> Result<Value, ParseError> {
    match value {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or(ParseError::NonFiniteNumber(f))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<_>, _> = seq.into_iter().map(convert_yaml).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = serde_json::Map::new();
            for (key, val) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    other => return Err(ParseError::NonStringKey(yaml_kind(&other))),
                };
                out.insert(key, convert_yaml(val)?);
            }
            Ok(Value::Object(out))
        }
        serde_yaml::Value::Tagged(tagged) => {
            Err(ParseError::UnsupportedNode(format!("tag {}", tagged.tag)))
        }
    }
}

/// Short description of a YAML node for error messages.
fn yaml_kind(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => format!("bool {b}"),
        serde_yaml::Value::Number(n) => format!("number {n}"),
        serde_yaml::Value::String(s) => format!("string {s:?}"),
        serde_yaml::Value::Sequence(_) => "sequence".to_string(),
        serde_yaml::Value::Mapping(_) => "mapping".to_string(),
        serde_yaml::Value::Tagged(t) => format!("tag {}", t.tag),
    }
}

/// Recursively write a value in canonical form.
///
/// Keys are collected and sorted explicitly at every mapping, so the output
/// order never depends on `serde_json`'s map backing or feature flags.
fn write_canonical(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_json_string(out, s),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(out, item);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_json_string(out, key);
                out.push(b':');
                // Key came from the map, so the lookup cannot miss.
                if let Some(val) = map.get(*key) {
                    write_canonical(out, val);
                }
            }
            out.push(b'}');
        }
    }
}

/// Write a string with only the escapes JSON requires.
///
/// Non-ASCII characters pass through verbatim as UTF-8.
fn write_json_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            c if (c as u32) < 0x20 => {
                let code = c as u32;
                out.extend_from_slice(format!("\\u{code:04x}").as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating arbitrary JSON value trees.
    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ éß→]{0,24}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z0-9_]{1,8}", inner, 0..8).prop_map(|m| {
                    Value::Object(m.into_iter().collect())
                }),
            ]
        })
    }

    proptest! {
        /// Same input always produces the same bytes.
        #[test]
        fn canonical_bytes_deterministic(value in json_value()) {
            let a = CanonicalBytes::from_value(&value);
            let b = CanonicalBytes::from_value(&value);
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        /// Canonical bytes are valid UTF-8.
        #[test]
        fn canonical_bytes_valid_utf8(value in json_value()) {
            let cb = CanonicalBytes::from_value(&value);
            prop_assert!(std::str::from_utf8(cb.as_bytes()).is_ok());
        }

        /// Canonical bytes parse back to the same value tree.
        #[test]
        fn canonical_bytes_round_trip(value in json_value()) {
            let cb = CanonicalBytes::from_value(&value);
            let parsed: Value = serde_json::from_slice(cb.as_bytes()).unwrap();
            prop_assert_eq!(parsed, value);
        }

        /// Mapping keys appear in sorted order in the output.
        #[test]
        fn canonical_bytes_sorted_keys(
            keys in prop::collection::btree_set("[a-z]{1,8}", 2..6)
        ) {
            let map: serde_json::Map<String, Value> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), serde_json::json!(i)))
                .collect();
            let cb = CanonicalBytes::from_value(&Value::Object(map));
            let s = std::str::from_utf8(cb.as_bytes()).unwrap().to_string();
            let mut last = None;
            for key in keys {
                let pos = s.find(&format!("\"{key}\"")).unwrap();
                if let Some(prev) = last {
                    prop_assert!(pos > prev);
                }
                last = Some(pos);
            }
        }
    }
}
