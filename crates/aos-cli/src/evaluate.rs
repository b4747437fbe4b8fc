//! # Evaluate Subcommand
//!
//! The full pipeline from the command line: load a constitution,
//! classify the call, run the two-pass rule engine, and print the
//! decision record as JSON with sorted keys.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use aos_policy::{
    Constitution, Evaluator, SubstitutionEnv, ToolCall, POLICY_ENGINE_VERSION,
};

use crate::{parse_object, read_text};

/// Arguments for `aos evaluate`.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Constitution YAML to evaluate against.
    #[arg(long)]
    pub constitution: PathBuf,

    /// Tool name of the proposed call.
    #[arg(long)]
    pub tool: String,

    /// Tool arguments as a JSON object literal.
    #[arg(long)]
    pub args: Option<String>,

    /// Read tool arguments from a JSON file instead.
    #[arg(long)]
    pub args_file: Option<PathBuf>,

    /// Intent context as a JSON object literal.
    #[arg(long)]
    pub intent: Option<String>,

    /// Read intent context from a JSON file instead.
    #[arg(long)]
    pub intent_file: Option<PathBuf>,

    /// Session kind proposing the call.
    #[arg(long, default_value = "main")]
    pub session_kind: String,

    /// Workspace path exposed as ${WORKSPACE} in allow_if prefixes.
    #[arg(long)]
    pub workspace: Option<String>,

    /// Engine version recorded in scope hashes.
    #[arg(long, default_value = POLICY_ENGINE_VERSION)]
    pub policy_engine_version: String,
}

/// Evaluate one call and print the decision record.
pub fn run_evaluate(args: &EvaluateArgs) -> Result<u8> {
    let call_args = if let Some(path) = &args.args_file {
        parse_object(&read_text(path)?, "args")?
    } else if let Some(literal) = &args.args {
        parse_object(literal, "args")?
    } else {
        eprintln!("Missing --args or --args-file");
        return Ok(2);
    };

    let intent = if let Some(path) = &args.intent_file {
        Some(parse_object(&read_text(path)?, "intent")?)
    } else if let Some(literal) = &args.intent {
        Some(parse_object(literal, "intent")?)
    } else {
        None
    };

    let constitution = Constitution::from_yaml_str(&read_text(&args.constitution)?)?;

    let mut env = SubstitutionEnv::new();
    if let Some(workspace) = &args.workspace {
        env.insert("WORKSPACE".to_string(), workspace.clone());
    }

    let mut call = ToolCall::new(args.tool.as_str(), call_args)
        .with_session_kind(args.session_kind.as_str());
    if let Some(intent) = intent {
        call = call.with_intent(intent);
    }

    let evaluator = Evaluator::new(constitution)
        .with_engine_version(args.policy_engine_version.as_str());
    let result = evaluator.evaluate(&call, &env);

    tracing::debug!(
        decision = %result.decision,
        risk = %result.risk,
        "evaluation complete"
    );

    println!("{}", serde_json::to_string_pretty(&result.to_value())?);
    Ok(0)
}
