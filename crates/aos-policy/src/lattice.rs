//! # Decision and Risk Lattices
//!
//! Both orders compose by `max`, which is associative, commutative, and
//! idempotent — so the final decision and risk are independent of the
//! order in which contributions arrive. A decision can be raised but
//! never lowered; that monotonicity is what makes the two-pass rule
//! sweep converge.

use serde::{Deserialize, Serialize};

/// The authorization decision for a tool call.
///
/// Total order: `allow < confirm < deny`. Derived `Ord` follows variant
/// declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The call may proceed without human involvement.
    Allow,
    /// The call requires human confirmation bound to a scope hash.
    Confirm,
    /// The call must not be executed.
    Deny,
}

impl Decision {
    /// Combine two decisions under the lattice (`max`).
    pub fn join(self, other: Self) -> Self {
        self.max(other)
    }

    /// The lowercase wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Confirm => "confirm",
            Decision::Deny => "deny",
        }
    }

    /// Parse the lowercase wire form. Returns `None` for unknown values;
    /// the constitution loader turns that into a schema violation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(Decision::Allow),
            "confirm" => Some(Decision::Confirm),
            "deny" => Some(Decision::Deny),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The coarse risk label computed deterministically from a call.
///
/// Total order: `low < medium < high < critical`. Not itself a decision —
/// rules consume it through `when.risk_at_least`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    /// No outward effect and no sensitive surface.
    Low,
    /// Default for unknown tools and plain file reads.
    Medium,
    /// Outward effect or sensitive surface.
    High,
    /// Arbitrary execution or broadcast reach.
    Critical,
}

impl Risk {
    /// Combine two risk contributions under the lattice (`max`).
    pub fn join(self, other: Self) -> Self {
        self.max(other)
    }

    /// Whether this risk meets a threshold.
    pub fn at_least(self, min: Self) -> bool {
        self >= min
    }

    /// The lowercase wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
            Risk::Critical => "critical",
        }
    }

    /// Parse the lowercase wire form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Risk::Low),
            "medium" => Some(Risk::Medium),
            "high" => Some(Risk::High),
            "critical" => Some(Risk::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
