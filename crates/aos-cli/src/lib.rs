//! # aos-cli — Subcommand Handlers
//!
//! One module per concern, each exposing a clap `Args` struct and a
//! `run_*` handler returning the process exit code: `0` success, `1`
//! verification or semantic failure, `2` usage error (clap produces its
//! own `2` for malformed invocations).

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

pub mod canon;
pub mod classify;
pub mod disclosure;
pub mod evaluate;
pub mod signing;
pub mod verify;

/// Read a UTF-8 text file with path context on failure.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse a JSON object literal (from a flag or a file).
pub fn parse_object(text: &str, what: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(text).with_context(|| format!("{what} is not valid JSON"))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{what} must be a JSON object"),
    }
}
