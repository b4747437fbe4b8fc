//! # Keygen and Sign Subcommands
//!
//! `aos keygen` prints a fresh Ed25519 key pair in hex. `aos sign`
//! canonicalizes a constitution, signs its digest, and writes the
//! detached signature record.
//!
//! The secret key comes from `--sk` or the `AOS_ED25519_SK` environment
//! variable; the key id from `--key-id` or `AOS_KEY_ID`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use rand_core::OsRng;

use aos_attest::sign_yaml;
use aos_crypto::SigningKey;

use crate::read_text;

/// Arguments for `aos keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {}

/// Arguments for `aos sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Path to the constitution YAML.
    pub yaml_path: PathBuf,

    /// Ed25519 secret key (hex or Base64). Falls back to AOS_ED25519_SK.
    #[arg(long)]
    pub sk: Option<String>,

    /// Signing key identifier. Falls back to AOS_KEY_ID, then
    /// `ed25519:UNSPECIFIED`.
    #[arg(long)]
    pub key_id: Option<String>,

    /// Output path for the signature record.
    #[arg(long)]
    pub out: PathBuf,

    /// Timestamp to record; `now` uses the current UTC time.
    #[arg(long)]
    pub signed_at: Option<String>,
}

/// Generate and print an Ed25519 key pair.
pub fn run_keygen(_args: &KeygenArgs) -> Result<u8> {
    let sk = SigningKey::generate(&mut OsRng);
    println!("secret_key: {}", sk.to_hex());
    println!("public_key: {}", sk.verifying_key().to_hex());
    Ok(0)
}

/// Sign a constitution and write the detached record.
pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let Some(sk_material) = args
        .sk
        .clone()
        .or_else(|| std::env::var("AOS_ED25519_SK").ok())
    else {
        eprintln!("Missing --sk (or env AOS_ED25519_SK)");
        return Ok(2);
    };

    let key_id = args
        .key_id
        .clone()
        .or_else(|| std::env::var("AOS_KEY_ID").ok())
        .unwrap_or_else(|| "ed25519:UNSPECIFIED".to_string());

    let signed_at = args.signed_at.as_deref().map(|s| {
        if s == "now" {
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
        } else {
            s.to_string()
        }
    });

    let sk = SigningKey::from_key_material(&sk_material)?;
    let yaml = read_text(&args.yaml_path)?;
    let record = sign_yaml(&yaml, &sk, &key_id, signed_at)?;

    let rendered = record.to_json_pretty()?;
    std::fs::write(&args.out, format!("{rendered}\n"))
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(out = %args.out.display(), key_id = %record.key_id, "signature record written");
    println!("{}", record.doc_hash);
    Ok(0)
}
