//! Dispersion diagnostics: coefficient of variation, maximum adjacent gap,
//! and the Gini index, combined into a single penalty subtracted from a
//! tier's weighted mean.
//!
//! A tier whose members agree closely scores close to their mean; a tier
//! whose members disagree sharply (one question passes, its neighbor
//! fails) gets docked even if the mean looks fine — high dispersion is
//! itself evidence the plan is uneven rather than genuinely strong.

use crate::core::DispersionPenalty;
use crate::error::{AggregationError, Result};

/// Weights applied to each component when combining them into the final
/// penalty. Chosen so no single component can zero out the others.
const CV_WEIGHT: f64 = 0.4;
const GAP_WEIGHT: f64 = 0.3;
const GINI_WEIGHT: f64 = 0.3;

/// Computes the dispersion penalty for a set of member scores.
///
/// # Errors
///
/// Returns [`AggregationError::NonFiniteDispersion`] if any score is
/// non-finite.
pub fn compute(key: &str, scores: &[f64]) -> Result<DispersionPenalty> {
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(AggregationError::NonFiniteDispersion { key: key.to_string() }.into());
    }
    if scores.len() < 2 {
        return Ok(DispersionPenalty::default());
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let coefficient_of_variation = if mean.abs() <= f64::EPSILON {
        0.0
    } else {
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        variance.sqrt() / mean
    };

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let max_gap = sorted.windows(2).map(|w| w[1] - w[0]).fold(0.0_f64, f64::max);

    let gini = gini_index(&sorted);

    let combined = (CV_WEIGHT * coefficient_of_variation.min(1.0) + GAP_WEIGHT * max_gap + GINI_WEIGHT * gini).clamp(0.0, 1.0);

    Ok(DispersionPenalty {
        coefficient_of_variation,
        max_gap,
        gini,
        combined,
    })
}

/// Gini index of a sorted non-negative sequence, in `[0, 1)` for identical
/// values and approaching `1` for maximal inequality.
fn gini_index(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = sorted.iter().sum();
    if sum.abs() <= f64::EPSILON {
        return 0.0;
    }
    let weighted_sum: f64 = sorted.iter().enumerate().map(|(i, &s)| (i as f64 + 1.0) * s).sum();
    ((2.0 * weighted_sum) / (n as f64 * sum) - (n as f64 + 1.0) / n as f64).clamp(0.0, 1.0)
}
