//! # Decision Engine
//! Maps raw message text → `Verdict` through an explicit, ordered policy:
//! rule short-circuit (SCAM), rule short-circuit (SAFE), then model fusion.
//! Pure given a fixed catalogue and classifier; no state between calls, so
//! concurrent use needs no locking.
//!
//! Policy: two or more matched SCAM categories decide on rules alone and the
//! classifier is never consulted; pure SAFE evidence returns a fixed verdict;
//! anything weaker consults the classifier and blends residual rule evidence
//! into its distribution.

use crate::classifier::{Distribution, DynTextClassifier};
use crate::signals::{SignalExtractor, SignalMatches};
use crate::verdict::{Label, RiskLevel, Verdict};
use tracing::debug;

const SCAM_SHORT_CIRCUIT_MIN: usize = 2;
const SHORT_CIRCUIT_SCAM_BASE: f64 = 0.85;
const SHORT_CIRCUIT_SAFE_BASE: f64 = 0.15;
const SHORT_CIRCUIT_STEP: f64 = 0.05;
const SHORT_CIRCUIT_CAP: f64 = 0.99;
const SHORT_CIRCUIT_FLOOR: f64 = 0.01;
const SAFE_FIXED_SCAM_PROBABILITY: f64 = 0.15;
const FUSION_STEP: f64 = 0.10;
const FUSION_CAP: f64 = 0.95;
/// Strict `>` boundary for the SCAM label; exactly 0.5 stays SAFE.
const SCAM_LABEL_MIN: f64 = 0.5;
/// Inclusive boundary for HIGH risk on a SCAM label.
const HIGH_RISK_MIN: f64 = 0.75;
/// Absorbs IEEE noise from the additive boosts (e.g. 0.40 + 0.10 landing a
/// hair above 0.5). The contract resolution is 4 decimal places, so this
/// cannot flip a genuine decision.
const PROB_EPS: f64 = 1e-9;

/// Which branch of the policy handles a message, decided purely on counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ScamShortCircuit,
    SafeShortCircuit,
    ModelFusion,
}

/// Ordered policy over `(scam_count, safe_count)`. A single weak SCAM signal
/// is not enough to short-circuit and falls through to fusion, as does a
/// message with no signals at all.
pub fn route(scam_count: usize, safe_count: usize) -> Route {
    match (scam_count, safe_count) {
        (s, _) if s >= SCAM_SHORT_CIRCUIT_MIN => Route::ScamShortCircuit,
        (0, f) if f >= 1 => Route::SafeShortCircuit,
        _ => Route::ModelFusion,
    }
}

/// The hybrid rule/model decision engine. Sole entry point: [`classify`].
///
/// [`classify`]: DecisionEngine::classify
pub struct DecisionEngine {
    extractor: SignalExtractor,
    classifier: DynTextClassifier,
}

impl DecisionEngine {
    /// Engine over the built-in signal catalogue.
    pub fn new(classifier: DynTextClassifier) -> Self {
        Self {
            extractor: SignalExtractor::new(),
            classifier,
        }
    }

    /// Engine with an explicit extractor (custom catalogue).
    pub fn with_extractor(extractor: SignalExtractor, classifier: DynTextClassifier) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    /// Classify a message. Accepts any string, including empty; the only
    /// error source is the classifier dependency, which propagates unchanged.
    pub async fn classify(&self, text: &str) -> anyhow::Result<Verdict> {
        let hits = self.extractor.scan(text);
        let route = route(hits.scam_count, hits.safe_count);
        // Never log raw text; hashed id only.
        debug!(
            id = %anon_hash(text),
            ?route,
            scam = hits.scam_count,
            safe = hits.safe_count,
            "routing message"
        );

        match route {
            Route::ScamShortCircuit => Ok(scam_short_circuit(&hits)),
            Route::SafeShortCircuit => Ok(safe_short_circuit()),
            Route::ModelFusion => {
                let dist = self.classifier.classify(text).await?;
                dist.validate()?;
                Ok(fuse(&hits, dist))
            }
        }
    }

    /// Name of the backing classifier, for diagnostics.
    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }
}

/// Rule-only SCAM verdict: always HIGH risk, classifier never consulted.
/// The two probabilities are computed independently and are not guaranteed
/// to sum to 1; kept as-is for output compatibility.
fn scam_short_circuit(hits: &SignalMatches) -> Verdict {
    let n = hits.scam_count as f64;
    let scam_p = (SHORT_CIRCUIT_SCAM_BASE + SHORT_CIRCUIT_STEP * n).min(SHORT_CIRCUIT_CAP);
    let safe_p = (SHORT_CIRCUIT_SAFE_BASE - SHORT_CIRCUIT_STEP * n).max(SHORT_CIRCUIT_FLOOR);
    Verdict::new(
        Label::Scam,
        scam_p,
        safe_p,
        RiskLevel::High,
        hits.scam_labels.clone(),
    )
}

/// Rule-only SAFE verdict: fixed probabilities, empty signal list.
fn safe_short_circuit() -> Verdict {
    Verdict::new(
        Label::Safe,
        SAFE_FIXED_SCAM_PROBABILITY,
        1.0 - SAFE_FIXED_SCAM_PROBABILITY,
        RiskLevel::Low,
        Vec::new(),
    )
}

/// Blend residual rule evidence into the classifier's distribution, then
/// apply the label and risk policy on the unrounded result.
fn fuse(hits: &SignalMatches, dist: Distribution) -> Verdict {
    let (scam_p, safe_p) = if hits.scam_count > 0 {
        let p = (dist.scam + FUSION_STEP * hits.scam_count as f64).min(FUSION_CAP);
        (p, 1.0 - p)
    } else if hits.safe_count > 0 {
        let p = (dist.safe + FUSION_STEP * hits.safe_count as f64).min(FUSION_CAP);
        (1.0 - p, p)
    } else {
        (dist.scam, dist.safe)
    };

    let label = if scam_p > SCAM_LABEL_MIN + PROB_EPS {
        Label::Scam
    } else {
        Label::Safe
    };
    let risk_level = match label {
        Label::Scam if scam_p >= HIGH_RISK_MIN - PROB_EPS => RiskLevel::High,
        Label::Scam => RiskLevel::Medium,
        Label::Safe => RiskLevel::Low,
    };

    Verdict::new(label, scam_p, safe_p, risk_level, hits.scam_labels.clone())
}

/// Short anonymized id for log lines (first 6 bytes of SHA-256, hex).
fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(scam: usize, safe: usize, labels: &[&str]) -> SignalMatches {
        SignalMatches {
            scam_count: scam,
            safe_count: safe,
            scam_labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn route_table() {
        assert_eq!(route(0, 0), Route::ModelFusion);
        assert_eq!(route(1, 0), Route::ModelFusion);
        // A lone SCAM signal still blocks the SAFE short-circuit.
        assert_eq!(route(1, 3), Route::ModelFusion);
        assert_eq!(route(2, 0), Route::ScamShortCircuit);
        assert_eq!(route(2, 5), Route::ScamShortCircuit);
        assert_eq!(route(7, 0), Route::ScamShortCircuit);
        assert_eq!(route(0, 1), Route::SafeShortCircuit);
        assert_eq!(route(0, 4), Route::SafeShortCircuit);
    }

    #[test]
    fn scam_short_circuit_scales_and_caps() {
        let v = scam_short_circuit(&hits(2, 0, &["A", "B"]));
        assert_eq!(v.label, Label::Scam);
        assert_eq!(v.risk_level, RiskLevel::High);
        assert_eq!(v.scam_probability, 0.95);
        assert_eq!(v.safe_probability, 0.05);
        assert_eq!(v.signals, vec!["A", "B"]);

        // Capped/floored at 5 matched categories.
        let v = scam_short_circuit(&hits(5, 0, &["A", "B", "C", "D", "E"]));
        assert_eq!(v.scam_probability, 0.99);
        assert_eq!(v.safe_probability, 0.01);
    }

    #[test]
    fn safe_short_circuit_is_fixed() {
        let v = safe_short_circuit();
        assert_eq!(v.label, Label::Safe);
        assert_eq!(v.risk_level, RiskLevel::Low);
        assert_eq!(v.scam_probability, 0.15);
        assert_eq!(v.safe_probability, 0.85);
        assert!(v.signals.is_empty());
    }

    #[test]
    fn fusion_boosts_scam_and_keeps_sum() {
        let v = fuse(&hits(1, 0, &["A"]), Distribution { safe: 0.3, scam: 0.7 });
        assert_eq!(v.scam_probability, 0.8);
        assert_eq!(v.safe_probability, 0.2);
        assert_eq!(v.label, Label::Scam);
        assert_eq!(v.risk_level, RiskLevel::High);
        assert_eq!(v.signals, vec!["A"]);
    }

    #[test]
    fn fusion_scam_boost_caps_at_095() {
        let v = fuse(&hits(1, 0, &["A"]), Distribution { safe: 0.08, scam: 0.92 });
        assert_eq!(v.scam_probability, 0.95);
        assert_eq!(v.safe_probability, 0.05);
    }

    #[test]
    fn fusion_boosts_safe_when_no_scam_evidence() {
        let v = fuse(&hits(0, 2, &[]), Distribution { safe: 0.5, scam: 0.5 });
        assert_eq!(v.safe_probability, 0.7);
        assert_eq!(v.scam_probability, 0.3);
        assert_eq!(v.label, Label::Safe);
        assert_eq!(v.risk_level, RiskLevel::Low);
    }

    #[test]
    fn fusion_passthrough_without_signals() {
        let v = fuse(&hits(0, 0, &[]), Distribution { safe: 0.25, scam: 0.75 });
        assert_eq!(v.scam_probability, 0.75);
        assert_eq!(v.label, Label::Scam);
        assert_eq!(v.risk_level, RiskLevel::High); // 0.75 is inclusive
    }

    #[test]
    fn exactly_half_is_safe() {
        // 0.40 + 0.10 lands a hair above 0.5 in IEEE arithmetic; policy
        // treats it as the 0.5 boundary, which stays SAFE (strict `>`).
        let v = fuse(&hits(1, 0, &["A"]), Distribution { safe: 0.6, scam: 0.4 });
        assert_eq!(v.scam_probability, 0.5);
        assert_eq!(v.label, Label::Safe);
        assert_eq!(v.risk_level, RiskLevel::Low);
    }

    #[test]
    fn medium_risk_below_high_boundary() {
        let v = fuse(&hits(1, 0, &["A"]), Distribution { safe: 0.36, scam: 0.64 });
        assert_eq!(v.scam_probability, 0.74);
        assert_eq!(v.label, Label::Scam);
        assert_eq!(v.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("hello");
        let b = anon_hash("hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_ne!(a, anon_hash("hello!"));
    }
}
