//! Evidence and probative-test types shared between the executor framework
//! and the Bayesian evidence engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The four probative-test variants from process tracing, distinguished by
/// how a positive/negative result updates belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestVariant {
    /// Necessary but not sufficient: failing it is fatal, passing it is weak.
    StrawInTheWind,
    /// Necessary, not sufficient: failing it rules the hypothesis out.
    Hoop,
    /// Sufficient, not necessary: passing it strongly confirms.
    SmokingGun,
    /// Necessary and sufficient: passing confirms, failing rules out.
    DoublyDecisive,
}

/// A probative test: how diagnostic a positive observation is, expressed as
/// sensitivity (true positive rate) and specificity (true negative rate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbativeTest {
    /// `P(observe evidence | hypothesis true)`.
    pub sensitivity: f64,
    /// `P(not observe evidence | hypothesis false)`.
    pub specificity: f64,
    /// Which of the four classic test shapes this is.
    pub variant: TestVariant,
}

impl ProbativeTest {
    /// Builds a test from the variant's canonical sensitivity/specificity
    /// profile — used when an executor does not supply explicit values.
    #[must_use]
    pub const fn canonical(variant: TestVariant) -> Self {
        let (sensitivity, specificity) = match variant {
            TestVariant::StrawInTheWind => (0.6, 0.6),
            TestVariant::Hoop => (0.9, 0.5),
            TestVariant::SmokingGun => (0.4, 0.95),
            TestVariant::DoublyDecisive => (0.9, 0.9),
        };
        Self {
            sensitivity,
            specificity,
            variant,
        }
    }

    /// Likelihood ratio for a positive observation, `sensitivity / (1 -
    /// specificity)`. Used by the Bayesian engine's odds-form update.
    #[must_use]
    pub fn positive_likelihood_ratio(&self) -> f64 {
        let denom = 1.0 - self.specificity;
        if denom <= f64::EPSILON { f64::INFINITY } else { self.sensitivity / denom }
    }

    /// Likelihood ratio for a negative observation, `(1 - sensitivity) /
    /// specificity`.
    #[must_use]
    pub fn negative_likelihood_ratio(&self) -> f64 {
        if self.specificity <= f64::EPSILON {
            f64::INFINITY
        } else {
            (1.0 - self.sensitivity) / self.specificity
        }
    }
}

/// A single method's contribution to a question's evidence pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodOutput {
    /// Fully-qualified method id.
    pub method_id: String,
    /// Raw confidence reported by the method, in `[0, 1]`.
    pub confidence: f64,
    /// Matched element identifiers (e.g. matched keyword ids, causal edge
    /// indices) this method found.
    pub matched_elements: BTreeSet<String>,
    /// Probative test profile applied to this method's output, if the
    /// executor framework classified one.
    pub probative_test: Option<ProbativeTest>,
}

/// The accumulated evidence for a single micro-question, across all methods
/// that executed for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Per-method outputs, keyed by method id.
    pub method_outputs: BTreeMap<String, MethodOutput>,
    /// Deduplicated union of matched elements across all methods.
    pub matched_elements: BTreeSet<String>,
    /// Posterior probability after Bayesian updating, `None` if no
    /// probative tests were applicable.
    pub posterior: Option<f64>,
}

impl Evidence {
    /// Adds a method's output, merging its matched elements into the
    /// deduplicated union.
    pub fn add(&mut self, output: MethodOutput) {
        self.matched_elements.extend(output.matched_elements.iter().cloned());
        self.method_outputs.insert(output.method_id.clone(), output);
    }

    /// Returns `true` if no method produced output for this question.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.method_outputs.is_empty()
    }

    /// Mean raw confidence across all contributing methods, or `0.0` if empty.
    #[must_use]
    pub fn mean_confidence(&self) -> f64 {
        if self.method_outputs.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.method_outputs.values().map(|m| m.confidence).sum();
        sum / self.method_outputs.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_hoop_is_high_sensitivity() {
        let test = ProbativeTest::canonical(TestVariant::Hoop);
        assert!(test.sensitivity > test.specificity);
    }

    #[test]
    fn test_canonical_smoking_gun_is_high_specificity() {
        let test = ProbativeTest::canonical(TestVariant::SmokingGun);
        assert!(test.specificity > test.sensitivity);
    }

    #[test]
    fn test_positive_likelihood_ratio_doubly_decisive() {
        let test = ProbativeTest::canonical(TestVariant::DoublyDecisive);
        assert!(test.positive_likelihood_ratio() > 1.0);
    }

    #[test]
    fn test_negative_likelihood_ratio_bounds() {
        let test = ProbativeTest::canonical(TestVariant::Hoop);
        assert!(test.negative_likelihood_ratio() < 1.0);
    }

    #[test]
    fn test_evidence_add_merges_matched_elements() {
        let mut evidence = Evidence::default();
        evidence.add(MethodOutput {
            method_id: "m1".to_string(),
            confidence: 0.8,
            matched_elements: BTreeSet::from(["kw1".to_string()]),
            probative_test: None,
        });
        evidence.add(MethodOutput {
            method_id: "m2".to_string(),
            confidence: 0.4,
            matched_elements: BTreeSet::from(["kw2".to_string()]),
            probative_test: None,
        });
        assert_eq!(evidence.matched_elements.len(), 2);
        assert!((evidence.mean_confidence() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_evidence_is_empty() {
        assert!(Evidence::default().is_empty());
    }
}
