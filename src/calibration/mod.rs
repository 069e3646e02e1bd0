//! The calibration registry: per-method, per-version fusion weights.
//!
//! A [`CalibrationRegistry`] is loaded once from a JSON file and never
//! mutated afterward — there is no `&mut self` accessor once `load`
//! returns, which is the mechanism (not a convention) that keeps
//! calibrations frozen for the lifetime of a run.

pub mod choquet;

pub use choquet::CalibrationEngine;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CalibrationError, Result};

/// Number of calibration layers in the fusion model.
pub const LAYER_COUNT: usize = 8;

/// The immutable context a calibration is evaluated under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationContext {
    /// Global question id, e.g. `"D3-Q07"`.
    pub question_id: String,
    /// Dimension, `1..=6`.
    pub dimension_id: u8,
    /// Policy area, `1..=10`.
    pub policy_area_id: u8,
    /// Unit of analysis the method operates over (`"chunk"`, `"document"`, ...).
    pub unit_of_analysis: String,
    /// This method's 1-based position among the methods scoring this question.
    pub method_position: u32,
    /// Total number of methods scoring this question.
    pub total_methods: u32,
}

/// Per-method, per-version calibration: linear layer weights plus pairwise
/// interaction weights for the Choquet 2-additive fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCalibration {
    /// Fully-qualified method id.
    pub method_id: String,
    /// Calibration version (methods may be recalibrated over time).
    pub version: u32,
    /// Linear weight per layer, indexed `0..LAYER_COUNT`, each `>= 0`.
    pub linear_weights: [f64; LAYER_COUNT],
    /// Pairwise interaction weight `a_lk` for `l < k`, each `>= 0`, keyed
    /// `"l,k"`.
    pub interaction_weights: BTreeMap<String, f64>,
    /// Minimum evidence count below which this method's output is ignored.
    pub min_evidence_threshold: u32,
    /// Confidence lower bound this method may report.
    pub confidence_floor: f64,
    /// Confidence upper bound this method may report.
    pub confidence_ceiling: f64,
    /// SHA-256 hash of the source this calibration was fit from.
    pub provenance_hash: String,
}

impl MethodCalibration {
    /// Validates the non-negativity, sum, and monotonicity constraints.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.linear_weights.iter().any(|&w| w < 0.0) {
            return Err(CalibrationError::InvalidWeights {
                method_id: self.method_id.clone(),
                reason: "linear weight below zero".to_string(),
            }
            .into());
        }
        if self.interaction_weights.values().any(|&w| w < 0.0) {
            return Err(CalibrationError::InvalidWeights {
                method_id: self.method_id.clone(),
                reason: "interaction weight below zero".to_string(),
            }
            .into());
        }
        let linear_sum: f64 = self.linear_weights.iter().sum();
        let interaction_sum: f64 = self.interaction_weights.values().sum();
        if linear_sum + interaction_sum > 1.0 + f64::EPSILON {
            return Err(CalibrationError::InvalidWeights {
                method_id: self.method_id.clone(),
                reason: format!(
                    "weight budget exceeded: linear {linear_sum} + interaction {interaction_sum} > 1"
                ),
            }
            .into());
        }
        for layer in 0..LAYER_COUNT {
            let monotone_term: f64 = (0..LAYER_COUNT)
                .filter(|&k| k != layer)
                .map(|k| self.interaction(layer, k))
                .sum();
            if self.linear_weights[layer] + monotone_term < 0.0 {
                return Err(CalibrationError::InvalidWeights {
                    method_id: self.method_id.clone(),
                    reason: format!("monotonicity violated at layer {layer}"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Looks up the interaction weight `a_lk` (symmetric in `l, k`).
    #[must_use]
    pub fn interaction(&self, l: usize, k: usize) -> f64 {
        if l == k {
            return 0.0;
        }
        let (lo, hi) = if l < k { (l, k) } else { (k, l) };
        *self.interaction_weights.get(&format!("{lo},{hi}")).unwrap_or(&0.0)
    }
}

/// The frozen registry of all method calibrations for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRegistry {
    calibrations: BTreeMap<String, MethodCalibration>,
}

impl CalibrationRegistry {
    /// Loads and validates a registry from a list of calibrations.
    ///
    /// # Errors
    ///
    /// Returns an error if any calibration is invalid, or if a method id
    /// appears more than once.
    pub fn load(calibrations: Vec<MethodCalibration>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for calibration in calibrations {
            calibration.validate()?;
            if map.insert(calibration.method_id.clone(), calibration).is_some() {
                return Err(CalibrationError::InvalidWeights {
                    method_id: map.keys().last().cloned().unwrap_or_default(),
                    reason: "duplicate calibration entry".to_string(),
                }
                .into());
            }
        }
        Ok(Self { calibrations: map })
    }

    /// Resolves the calibration for a method id.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::MissingRequired`] if no calibration is
    /// registered for `method_id`.
    pub fn resolve(&self, method_id: &str) -> Result<&MethodCalibration> {
        self.calibrations.get(method_id).ok_or_else(|| {
            CalibrationError::MissingRequired {
                method_id: method_id.to_string(),
            }
            .into()
        })
    }

    /// Returns the full map of calibrations, for cross-checking against a
    /// [`crate::catalog::MethodCatalog`].
    #[must_use]
    pub fn calibrations(&self) -> &BTreeMap<String, MethodCalibration> {
        &self.calibrations
    }

    /// Returns the number of registered calibrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calibrations.len()
    }

    /// Returns `true` if the registry has no calibrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calibrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_calibration(id: &str) -> MethodCalibration {
        let mut linear_weights = [0.0; LAYER_COUNT];
        linear_weights[0] = 0.5;
        MethodCalibration {
            method_id: id.to_string(),
            version: 1,
            linear_weights,
            interaction_weights: BTreeMap::new(),
            min_evidence_threshold: 1,
            confidence_floor: 0.0,
            confidence_ceiling: 1.0,
            provenance_hash: "abc123".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_simple_calibration() {
        assert!(valid_calibration("m1").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut calibration = valid_calibration("m1");
        calibration.linear_weights[0] = -0.1;
        assert!(calibration.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_budget_overflow() {
        let mut calibration = valid_calibration("m1");
        calibration.linear_weights = [0.3; LAYER_COUNT];
        assert!(calibration.validate().is_err());
    }

    #[test]
    fn test_interaction_is_symmetric() {
        let mut calibration = valid_calibration("m1");
        calibration.interaction_weights.insert("1,3".to_string(), 0.05);
        assert_eq!(calibration.interaction(1, 3), calibration.interaction(3, 1));
    }

    #[test]
    fn test_registry_resolve_missing() {
        let registry = CalibrationRegistry::load(Vec::new()).unwrap();
        assert!(registry.resolve("missing").is_err());
    }

    #[test]
    fn test_registry_resolve_present() {
        let registry = CalibrationRegistry::load(vec![valid_calibration("m1")]).unwrap();
        assert!(registry.resolve("m1").is_ok());
    }

    #[test]
    fn test_registry_rejects_invalid_calibration() {
        let mut bad = valid_calibration("m1");
        bad.linear_weights[0] = -1.0;
        assert!(CalibrationRegistry::load(vec![bad]).is_err());
    }
}
