//! # Apply-Disclosure Subcommand
//!
//! Demonstrates how a Gateway enforces the disclosure obligation: given
//! a constitution and an outbound message, print the message with the
//! disclosure footer applied when it is missing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use aos_policy::disclosure::{apply_disclosure, disclosure_from_constitution};
use aos_policy::Constitution;

use crate::read_text;

/// Arguments for `aos apply-disclosure`.
#[derive(Args, Debug)]
pub struct ApplyDisclosureArgs {
    /// Constitution YAML declaring the disclosure obligation.
    #[arg(long)]
    pub constitution: PathBuf,

    /// The outbound message text.
    #[arg(long)]
    pub message: Option<String>,

    /// Read the outbound message from a file instead.
    #[arg(long)]
    pub message_file: Option<PathBuf>,
}

/// Apply the constitution's disclosure obligation and print the final
/// message.
pub fn run_apply_disclosure(args: &ApplyDisclosureArgs) -> Result<u8> {
    let message = if let Some(path) = &args.message_file {
        read_text(path)?
    } else if let Some(literal) = &args.message {
        literal.clone()
    } else {
        eprintln!("Provide --message or --message-file");
        return Ok(2);
    };

    let constitution = Constitution::from_yaml_str(&read_text(&args.constitution)?)?;
    let disclosure = disclosure_from_constitution(&constitution);

    print!("{}", apply_disclosure(&message, disclosure.as_ref()));
    Ok(0)
}
