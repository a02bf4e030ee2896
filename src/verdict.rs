//! verdict.rs — Output structures for the scam/safe decision.
//!
//! The `Verdict` is the sole artifact handed to the serving and report layers,
//! which serialize it as needed. Field names follow the established JSON
//! contract: `label`, `scam_probability`, `safe_probability`, `risk_level`,
//! `signals`.
//!
//! Probabilities are rounded to 4 decimal places at construction. Rounding is
//! cosmetic only; the engine makes label and risk decisions on unrounded
//! values before building the verdict.

use serde::{Deserialize, Serialize};

/// Final classification of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Scam,
    Safe,
}

/// Coarse severity bucket derived from the final probability and label.
/// `High` only ever accompanies `Label::Scam`; `Low` only `Label::Safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Complete decision including explainability signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    pub scam_probability: f64,
    pub safe_probability: f64,
    pub risk_level: RiskLevel,
    /// Matched SCAM category labels, in catalogue order. May be empty even
    /// for a SCAM verdict when the call came purely from the classifier.
    #[serde(default)]
    pub signals: Vec<String>,
}

impl Verdict {
    /// Build a verdict, rounding both probabilities for output.
    pub fn new(
        label: Label,
        scam_probability: f64,
        safe_probability: f64,
        risk_level: RiskLevel,
        signals: Vec<String>,
    ) -> Self {
        Self {
            label,
            scam_probability: round4(scam_probability),
            safe_probability: round4(safe_probability),
            risk_level,
            signals,
        }
    }
}

/// Round to 4 decimal places (the output contract resolution).
pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
