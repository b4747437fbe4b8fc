//! # Canonicalize and Hash Subcommands
//!
//! `aos canonicalize` prints a document's canonical JSON bytes;
//! `aos hash` prints its `sha256:<hex>` doc hash. Both read the same
//! canonicalization path the signer and verifier use.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use aos_core::{sha256_hex, CanonicalBytes};

use crate::read_text;

/// Arguments for `aos canonicalize`.
#[derive(Args, Debug)]
pub struct CanonicalizeArgs {
    /// Path to the YAML document.
    pub yaml_path: PathBuf,
}

/// Arguments for `aos hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Path to the YAML document.
    pub yaml_path: PathBuf,
}

/// Print the canonical JSON bytes of a document to stdout.
pub fn run_canonicalize(args: &CanonicalizeArgs) -> Result<u8> {
    let text = read_text(&args.yaml_path)?;
    let canonical = CanonicalBytes::from_yaml_str(&text)?;
    std::io::stdout().write_all(canonical.as_bytes())?;
    Ok(0)
}

/// Print the `sha256:<hex>` doc hash of a document.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let text = read_text(&args.yaml_path)?;
    let canonical = CanonicalBytes::from_yaml_str(&text)?;
    println!("{}", sha256_hex(&canonical));
    Ok(0)
}
