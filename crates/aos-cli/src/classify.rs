//! # Classify Subcommand
//!
//! Runs the deterministic classifiers over one tool call and prints the
//! risk, the sorted tag list, and the audit details.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use aos_policy::{classify, AuditDetails, Constitution, Risk, ToolCall};

use crate::{parse_object, read_text};

/// Arguments for `aos classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Tool name, e.g. message.send.
    pub tool: String,

    /// Tool arguments as a JSON object literal.
    pub args_json: Option<String>,

    /// Read tool arguments from a JSON file instead.
    #[arg(long)]
    pub args_file: Option<PathBuf>,

    /// Constitution YAML supplying the egress allowlist.
    #[arg(long)]
    pub constitution: Option<PathBuf>,

    /// Session kind proposing the call.
    #[arg(long, default_value = "main")]
    pub session_kind: String,

    /// Intent context as a JSON object literal.
    #[arg(long)]
    pub intent: Option<String>,
}

/// The classifier's CLI output shape (keys serialize in sorted order).
#[derive(Serialize)]
struct ClassifyOutput {
    classifications: Vec<String>,
    details: AuditDetails,
    risk: Risk,
}

/// Classify one call and print the result as JSON.
pub fn run_classify(args: &ClassifyArgs) -> Result<u8> {
    let call_args = if let Some(path) = &args.args_file {
        parse_object(&read_text(path)?, "args")?
    } else if let Some(literal) = &args.args_json {
        parse_object(literal, "args")?
    } else {
        eprintln!("Missing args: provide <args_json> or --args-file");
        return Ok(2);
    };

    let constitution = match &args.constitution {
        Some(path) => Some(Constitution::from_yaml_str(&read_text(path)?)?),
        None => None,
    };

    let intent = args
        .intent
        .as_deref()
        .map(|text| parse_object(text, "intent"))
        .transpose()?;

    let mut call =
        ToolCall::new(args.tool.as_str(), call_args).with_session_kind(args.session_kind.as_str());
    if let Some(intent) = intent {
        call = call.with_intent(intent);
    }

    let classified = classify(&call, constitution.as_ref());
    let output = ClassifyOutput {
        classifications: classified.tag_names(),
        details: classified.details,
        risk: classified.risk,
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(0)
}
