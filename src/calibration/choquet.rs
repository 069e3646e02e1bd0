//! Choquet 2-additive fusion: combines the eight layer signals for one
//! method invocation into a single calibrated confidence.
//!
//! `score = sum_l a_l * x_l + sum_{l<k} a_lk * min(x_l, x_k)`, checked
//! against the method's `[confidence_floor, confidence_ceiling]` band. A
//! fused score outside that band means the calibration's weights are
//! miswired, not that the score needs correcting, so fusion fails rather
//! than clamping. The pairwise `min` terms are what make this
//! "2-additive": interactions beyond pairs are not modeled, matching the
//! calibration's weight schema (which only has slots for pairs).

use crate::calibration::{CalibrationContext, MethodCalibration, LAYER_COUNT};
use crate::error::{CalibrationError, Result};

/// Stateless fusion engine. Holds no data of its own; every call is pure in
/// `(calibration, layer_signals, context)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalibrationEngine;

impl CalibrationEngine {
    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Fuses eight layer signals (each expected in `[0, 1]`) through the
    /// calibration's weights, returning the fused confidence.
    ///
    /// `context` is accepted for parity with the calibration contract (some
    /// calibrations scale by `method_position`/`total_methods` in richer
    /// deployments) and is currently used only to validate that the method's
    /// evidence threshold is met before fusing.
    ///
    /// # Errors
    ///
    /// Returns an error if any layer signal is outside `[0, 1]`, if the
    /// context's `total_methods` is zero, or if the fused score falls
    /// outside the calibration's `[confidence_floor, confidence_ceiling]`
    /// band. Miswired weights are a configuration defect to surface, not a
    /// value to silently correct.
    pub fn fuse(
        &self,
        calibration: &MethodCalibration,
        layer_signals: &[f64; LAYER_COUNT],
        context: &CalibrationContext,
    ) -> Result<f64> {
        if context.total_methods == 0 {
            return Err(CalibrationError::InvalidWeights {
                method_id: calibration.method_id.clone(),
                reason: "total_methods is zero".to_string(),
            }
            .into());
        }
        for (layer, &signal) in layer_signals.iter().enumerate() {
            if !(0.0..=1.0).contains(&signal) {
                return Err(CalibrationError::InvalidWeights {
                    method_id: calibration.method_id.clone(),
                    reason: format!("layer {layer} signal {signal} outside [0, 1]"),
                }
                .into());
            }
        }

        let linear: f64 = (0..LAYER_COUNT).map(|l| calibration.linear_weights[l] * layer_signals[l]).sum();

        let mut interaction = 0.0;
        for l in 0..LAYER_COUNT {
            for k in (l + 1)..LAYER_COUNT {
                let weight = calibration.interaction(l, k);
                if weight > 0.0 {
                    interaction += weight * layer_signals[l].min(layer_signals[k]);
                }
            }
        }

        let raw = linear + interaction;
        if raw < calibration.confidence_floor || raw > calibration.confidence_ceiling {
            return Err(CalibrationError::InvalidWeights {
                method_id: calibration.method_id.clone(),
                reason: format!(
                    "fused score {raw} outside confidence band [{}, {}]",
                    calibration.confidence_floor, calibration.confidence_ceiling
                ),
            }
            .into());
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn calibration_with(linear: [f64; LAYER_COUNT], interactions: &[(usize, usize, f64)]) -> MethodCalibration {
        let mut interaction_weights = BTreeMap::new();
        for &(l, k, w) in interactions {
            let (lo, hi) = if l < k { (l, k) } else { (k, l) };
            interaction_weights.insert(format!("{lo},{hi}"), w);
        }
        MethodCalibration {
            method_id: "m1".to_string(),
            version: 1,
            linear_weights: linear,
            interaction_weights,
            min_evidence_threshold: 1,
            confidence_floor: 0.0,
            confidence_ceiling: 1.0,
            provenance_hash: "hash".to_string(),
        }
    }

    fn context() -> CalibrationContext {
        CalibrationContext {
            question_id: "D1-Q01".to_string(),
            dimension_id: 1,
            policy_area_id: 1,
            unit_of_analysis: "chunk".to_string(),
            method_position: 1,
            total_methods: 1,
        }
    }

    #[test]
    fn test_fuse_pure_linear() {
        let mut linear = [0.0; LAYER_COUNT];
        linear[0] = 0.5;
        linear[1] = 0.5;
        let calibration = calibration_with(linear, &[]);
        let mut signals = [0.0; LAYER_COUNT];
        signals[0] = 1.0;
        signals[1] = 1.0;
        let engine = CalibrationEngine::new();
        let score = engine.fuse(&calibration, &signals, &context()).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fuse_interaction_term_uses_min() {
        let linear = [0.0; LAYER_COUNT];
        let calibration = calibration_with(linear, &[(0, 1, 0.5)]);
        let mut signals = [0.0; LAYER_COUNT];
        signals[0] = 1.0;
        signals[1] = 0.4;
        let engine = CalibrationEngine::new();
        let score = engine.fuse(&calibration, &signals, &context()).unwrap();
        assert!((score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_fuse_rejects_score_outside_confidence_band() {
        let mut calibration = calibration_with([0.2; LAYER_COUNT], &[]);
        calibration.confidence_ceiling = 0.5;
        let signals = [1.0; LAYER_COUNT];
        let engine = CalibrationEngine::new();
        assert!(engine.fuse(&calibration, &signals, &context()).is_err());
    }

    #[test]
    fn test_fuse_accepts_score_within_confidence_band() {
        let calibration = calibration_with([0.1; LAYER_COUNT], &[]);
        let signals = [1.0; LAYER_COUNT];
        let engine = CalibrationEngine::new();
        let score = engine.fuse(&calibration, &signals, &context()).unwrap();
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_fuse_rejects_out_of_range_signal() {
        let calibration = calibration_with([0.1; LAYER_COUNT], &[]);
        let mut signals = [0.0; LAYER_COUNT];
        signals[0] = 1.5;
        let engine = CalibrationEngine::new();
        assert!(engine.fuse(&calibration, &signals, &context()).is_err());
    }

    #[test]
    fn test_fuse_rejects_zero_total_methods() {
        let calibration = calibration_with([0.1; LAYER_COUNT], &[]);
        let signals = [0.5; LAYER_COUNT];
        let mut ctx = context();
        ctx.total_methods = 0;
        let engine = CalibrationEngine::new();
        assert!(engine.fuse(&calibration, &signals, &ctx).is_err());
    }
}
