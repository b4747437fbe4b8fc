//! # aos CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Uses clap derive macros; handlers return exit codes (`0` success, `1`
//! verification or semantic failure, `2` usage error).

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aos_cli::canon::{run_canonicalize, run_hash, CanonicalizeArgs, HashArgs};
use aos_cli::classify::{run_classify, ClassifyArgs};
use aos_cli::disclosure::{run_apply_disclosure, ApplyDisclosureArgs};
use aos_cli::evaluate::{run_evaluate, EvaluateArgs};
use aos_cli::signing::{run_keygen, run_sign, KeygenArgs, SignArgs};
use aos_cli::verify::{run_check_attestation, run_verify, CheckAttestationArgs, VerifyArgs};

/// AOS policy toolchain.
///
/// Canonicalizes and hashes constitution documents, signs and verifies
/// them with Ed25519, checks attestation records, and evaluates proposed
/// tool calls against a constitution.
#[derive(Parser, Debug)]
#[command(name = "aos", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a document's canonical JSON bytes.
    Canonicalize(CanonicalizeArgs),

    /// Print a document's sha256:<hex> hash.
    Hash(HashArgs),

    /// Generate an Ed25519 key pair.
    Keygen(KeygenArgs),

    /// Sign a constitution, producing a detached signature record.
    Sign(SignArgs),

    /// Verify a constitution against a detached signature record.
    Verify(VerifyArgs),

    /// Structurally check an attestation record.
    CheckAttestation(CheckAttestationArgs),

    /// Classify a tool call: risk, tags, and audit details.
    Classify(ClassifyArgs),

    /// Evaluate a tool call against a constitution.
    Evaluate(EvaluateArgs),

    /// Apply a constitution's disclosure obligation to a message.
    ApplyDisclosure(ApplyDisclosureArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Canonicalize(args) => run_canonicalize(&args),
        Commands::Hash(args) => run_hash(&args),
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Sign(args) => run_sign(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::CheckAttestation(args) => run_check_attestation(&args),
        Commands::Classify(args) => run_classify(&args),
        Commands::Evaluate(args) => run_evaluate(&args),
        Commands::ApplyDisclosure(args) => run_apply_disclosure(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
