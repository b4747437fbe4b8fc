//! # Verify and Check-Attestation Subcommands
//!
//! `aos verify` checks a detached signature record against a
//! constitution, distinguishing a document change (hash mismatch) from a
//! wrong signature. `aos check-attestation` validates the structural
//! shape of an attestation record and prints the checker's report.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use aos_attest::{check_attestation, verify_yaml, SignatureError, SignatureRecord};
use aos_crypto::VerifyingKey;

use crate::read_text;

/// Arguments for `aos verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the constitution YAML.
    pub yaml_path: PathBuf,

    /// Path to the detached signature record JSON.
    #[arg(long)]
    pub sig: PathBuf,

    /// Ed25519 public key (hex or Base64).
    #[arg(long)]
    pub pk: String,
}

/// Arguments for `aos check-attestation`.
#[derive(Args, Debug)]
pub struct CheckAttestationArgs {
    /// Path to the attestation record JSON.
    pub attestation_path: PathBuf,
}

/// Verify a signature record. Exit 0 on success, 1 on any verification
/// failure.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let yaml = read_text(&args.yaml_path)?;
    let record = SignatureRecord::from_json(&read_text(&args.sig)?)?;
    let key = VerifyingKey::from_key_material(&args.pk)?;

    match verify_yaml(&yaml, &record, &key) {
        Ok(()) => {
            println!("OK: Ed25519 signature verified");
            Ok(0)
        }
        Err(e @ SignatureError::HashMismatch { .. }) => {
            eprintln!("{e}");
            Ok(1)
        }
        Err(SignatureError::BadSignature(msg)) => {
            eprintln!("signature invalid: {msg}");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

/// Structurally check an attestation record and print the report.
pub fn run_check_attestation(args: &CheckAttestationArgs) -> Result<u8> {
    let text = read_text(&args.attestation_path)?;
    match check_attestation(&text) {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(0)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(1)
        }
    }
}
