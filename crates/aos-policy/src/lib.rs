//! # aos-policy — Deterministic Policy Evaluation
//!
//! Decides whether a proposed agent tool call is permitted, must be
//! confirmed by a human, or must be denied — as a pure function of the
//! constitution, the call, and the substitution environment. No I/O, no
//! learned judgment, no shared mutable state.
//!
//! ## Pipeline
//!
//! ```text
//! (constitution, call) → classify risk → classify tags
//!                      → pass-1 rules → pass-2 rules (decision visible)
//!                      → merge → optional scope hash → EvalResult
//! ```
//!
//! - [`constitution`]: the validated policy document (defaults, egress
//!   allowlist, ordered rules).
//! - [`lattice`]: the `allow < confirm < deny` decision order and the
//!   `low < medium < high < critical` risk order; composition is `max`.
//! - [`risk`] and [`classify`]: deterministic tagging of a call, used by
//!   rule predicates and carried into the result for audit.
//! - [`engine`]: the two-pass rule sweep accumulating obligations.
//! - [`evaluate`]: the facade composing the pipeline and deriving the
//!   scope hash for confirmable calls.
//! - [`disclosure`]: the Gateway-side disclosure obligation helper.
//!
//! ## Crate Policy
//!
//! - Evaluation is total: every well-formed input produces an
//!   [`EvalResult`]. Parse and schema errors surface at load time, never
//!   mid-evaluation.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod call;
pub mod classify;
pub mod constitution;
pub mod disclosure;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod lattice;
pub mod risk;

pub use call::ToolCall;
pub use classify::{classify, AuditDetails, Classification, Classified};
pub use constitution::{Constitution, Rule};
pub use disclosure::{
    apply_disclosure, disclosure_from_constitution, disclosure_from_obligations,
    DisclosureObligation,
};
pub use error::ConstitutionError;
pub use evaluate::{EvalResult, Evaluator, SubstitutionEnv, POLICY_ENGINE_VERSION};
pub use lattice::{Decision, Risk};
pub use risk::classify_risk;
