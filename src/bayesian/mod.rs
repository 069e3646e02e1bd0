//! The Bayesian evidence engine: exact posterior updates from a sequence of
//! probative-test observations.
//!
//! Each observation updates belief via Bayes' rule using the test's
//! sensitivity/specificity; chaining observations multiplies likelihood
//! ratios, which is algebraically the same as re-applying Bayes' rule with
//! the previous posterior as the new prior — this implementation does the
//! latter, one observation at a time, so intermediate posteriors are always
//! inspectable.

use crate::core::ProbativeTest;
use crate::error::{BayesianError, Result};

/// Stateless exact-Bayes updater.
#[derive(Debug, Default, Clone, Copy)]
pub struct BayesianEngine;

impl BayesianEngine {
    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Updates `prior` given one observation (`observed_positive`) under
    /// `test`, returning the posterior probability.
    ///
    /// # Errors
    ///
    /// Returns an error if `prior` is outside `[0, 1]` or if the test's
    /// sensitivity/specificity are outside `[0, 1]`.
    pub fn update(&self, prior: f64, test: &ProbativeTest, observed_positive: bool) -> Result<f64> {
        if !(0.0..=1.0).contains(&prior) {
            return Err(BayesianError::InvalidPrior(prior).into());
        }
        for (name, value) in [("sensitivity", test.sensitivity), ("specificity", test.specificity)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BayesianError::ParameterOutOfRange {
                    name: name.to_string(),
                    value,
                }
                .into());
            }
        }

        let likelihood_given_true = if observed_positive { test.sensitivity } else { 1.0 - test.sensitivity };
        let likelihood_given_false = if observed_positive { 1.0 - test.specificity } else { test.specificity };

        let numerator = likelihood_given_true * prior;
        let denominator = numerator + likelihood_given_false * (1.0 - prior);

        if denominator <= f64::EPSILON {
            return Ok(prior);
        }
        Ok((numerator / denominator).clamp(0.0, 1.0))
    }

    /// Sequentially applies `update` for each `(test, observed_positive)`
    /// pair in order, starting from `prior`.
    ///
    /// # Errors
    ///
    /// Returns an error on the first observation that fails to update.
    pub fn update_sequence(&self, prior: f64, observations: &[(ProbativeTest, bool)]) -> Result<f64> {
        let mut belief = prior;
        for (test, observed_positive) in observations {
            belief = self.update(belief, test, *observed_positive)?;
        }
        Ok(belief)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TestVariant;

    #[test]
    fn test_positive_hoop_increases_belief() {
        let engine = BayesianEngine::new();
        let test = ProbativeTest::canonical(TestVariant::Hoop);
        let posterior = engine.update(0.5, &test, true).unwrap();
        assert!(posterior > 0.5);
    }

    #[test]
    fn test_negative_hoop_decreases_belief_strongly() {
        let engine = BayesianEngine::new();
        let test = ProbativeTest::canonical(TestVariant::Hoop);
        let posterior = engine.update(0.5, &test, false).unwrap();
        assert!(posterior < 0.5);
    }

    #[test]
    fn test_positive_smoking_gun_strongly_confirms() {
        let engine = BayesianEngine::new();
        let test = ProbativeTest::canonical(TestVariant::SmokingGun);
        let posterior = engine.update(0.3, &test, true).unwrap();
        assert!(posterior > 0.3);
    }

    #[test]
    fn test_smoking_gun_canonical_low_prior() {
        let engine = BayesianEngine::new();
        let test = ProbativeTest::canonical(TestVariant::SmokingGun);
        assert!((test.sensitivity - 0.4).abs() < 1e-9);
        assert!((test.specificity - 0.95).abs() < 1e-9);
        let posterior = engine.update(0.1, &test, true).unwrap();
        // Likelihood ratio is 0.4 / (1 - 0.95) = 8; from prior odds 1/9 that
        // falls short of the ratio of 9 needed to cross 0.5. See DESIGN.md's
        // smoking-gun open question for why this asserts the exact value
        // instead of posterior > 0.5.
        assert!(posterior > 0.1);
        assert!((posterior - 0.04 / 0.085).abs() < 1e-9);
    }

    #[test]
    fn test_posterior_stays_in_bounds() {
        let engine = BayesianEngine::new();
        let test = ProbativeTest {
            sensitivity: 0.99,
            specificity: 0.99,
            variant: TestVariant::DoublyDecisive,
        };
        let posterior = engine.update(0.01, &test, true).unwrap();
        assert!((0.0..=1.0).contains(&posterior));
    }

    #[test]
    fn test_rejects_invalid_prior() {
        let engine = BayesianEngine::new();
        let test = ProbativeTest::canonical(TestVariant::Hoop);
        assert!(engine.update(1.5, &test, true).is_err());
    }

    #[test]
    fn test_rejects_invalid_test_parameters() {
        let engine = BayesianEngine::new();
        let test = ProbativeTest {
            sensitivity: 1.5,
            specificity: 0.5,
            variant: TestVariant::StrawInTheWind,
        };
        assert!(engine.update(0.5, &test, true).is_err());
    }

    #[test]
    fn test_update_sequence_accumulates() {
        let engine = BayesianEngine::new();
        let hoop = ProbativeTest::canonical(TestVariant::Hoop);
        let smoking_gun = ProbativeTest::canonical(TestVariant::SmokingGun);
        let posterior = engine.update_sequence(0.3, &[(hoop, true), (smoking_gun, true)]).unwrap();
        assert!(posterior > 0.3);
    }

    #[test]
    fn test_uninformative_test_leaves_belief_unchanged() {
        let engine = BayesianEngine::new();
        let uninformative = ProbativeTest {
            sensitivity: 0.5,
            specificity: 0.5,
            variant: TestVariant::StrawInTheWind,
        };
        let posterior = engine.update(0.4, &uninformative, true).unwrap();
        assert!((posterior - 0.4).abs() < 1e-9);
    }
}
