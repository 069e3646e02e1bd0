//! Turns an evidence pool into a scored result, in one of two modalities.
//!
//! `TypeA` questions report a discrete quality level from a fixed four-tier
//! scale; `TypeB` questions report a continuous score in `[0, 1]` with no
//! discretization. Both read the same [`crate::core::Evidence`] — the
//! modality only changes what happens to the number at the end.

use serde::{Deserialize, Serialize};

use crate::core::{Evidence, ScoredResult};
use crate::error::{Result, ScoringError};

/// Which modality a question template reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringModality {
    /// Discrete quality level from a fixed four-tier scale.
    TypeA,
    /// Continuous score in `[0, 1]`.
    TypeB,
}

/// The four-tier discrete quality scale `TypeA` questions report against,
/// bucketed by element-presence ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    /// Ratio in `[0.0, 0.40)`.
    Insuficiente,
    /// Ratio in `[0.40, 0.65)`.
    Basico,
    /// Ratio in `[0.65, 0.85)`.
    Satisfactorio,
    /// Ratio in `[0.85, 1.0]`.
    Excelente,
}

/// Threshold above which a `TypeA` score is `Basico` or higher.
pub const BASICO_THRESHOLD: f64 = 0.40;
/// Threshold above which a `TypeA` score is `Satisfactorio` or higher.
pub const SATISFACTORIO_THRESHOLD: f64 = 0.65;
/// Threshold above which a `TypeA` score is `Excelente`.
pub const EXCELENTE_THRESHOLD: f64 = 0.85;

impl QualityLevel {
    /// Buckets a continuous element-presence ratio into its discrete level.
    /// Monotone non-decreasing in `score` by construction.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::NoMatchingLevel`] if `score` is outside
    /// `[0, 1]`.
    pub fn from_score(score: f64) -> Result<Self> {
        match score {
            s if !(0.0..=1.0).contains(&s) => Err(ScoringError::NoMatchingLevel { score: s }.into()),
            s if s >= EXCELENTE_THRESHOLD => Ok(Self::Excelente),
            s if s >= SATISFACTORIO_THRESHOLD => Ok(Self::Satisfactorio),
            s if s >= BASICO_THRESHOLD => Ok(Self::Basico),
            _ => Ok(Self::Insuficiente),
        }
    }

    /// The label used in JSON/CLI output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Insuficiente => "insuficiente",
            Self::Basico => "basico",
            Self::Satisfactorio => "satisfactorio",
            Self::Excelente => "excelente",
        }
    }
}

/// Stateless scorer: reads an [`Evidence`] pool, produces a [`ScoredResult`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Scorer;

impl Scorer {
    /// Creates the scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scores one question's evidence pool under `modality`.
    ///
    /// # Errors
    ///
    /// Returns an error if the computed score falls outside `[0, 1]`
    /// (`TypeB`) or has no matching quality level (`TypeA`).
    pub fn score(
        &self,
        question_global_id: impl Into<String>,
        base_slot: impl Into<String>,
        policy_area_id: u8,
        dimension_id: u8,
        modality: ScoringModality,
        evidence: Evidence,
    ) -> Result<ScoredResult> {
        let raw = evidence.posterior.unwrap_or_else(|| evidence.mean_confidence());
        if !(0.0..=1.0).contains(&raw) {
            return Err(ScoringError::ScoreOutOfRange(raw).into());
        }
        let quality_level = match modality {
            ScoringModality::TypeA => Some(QualityLevel::from_score(raw)?.label().to_string()),
            ScoringModality::TypeB => None,
        };
        Ok(ScoredResult {
            question_global_id: question_global_id.into(),
            base_slot: base_slot.into(),
            policy_area_id,
            dimension_id,
            score: raw,
            quality_level,
            evidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MethodOutput;
    use std::collections::BTreeSet;

    fn evidence_with_confidence(confidence: f64) -> Evidence {
        let mut evidence = Evidence::default();
        evidence.add(MethodOutput {
            method_id: "m1".to_string(),
            confidence,
            matched_elements: BTreeSet::new(),
            probative_test: None,
        });
        evidence
    }

    #[test]
    fn test_quality_level_boundaries() {
        assert_eq!(QualityLevel::from_score(0.0).unwrap(), QualityLevel::Insuficiente);
        assert_eq!(QualityLevel::from_score(0.40).unwrap(), QualityLevel::Basico);
        assert_eq!(QualityLevel::from_score(0.65).unwrap(), QualityLevel::Satisfactorio);
        assert_eq!(QualityLevel::from_score(0.85).unwrap(), QualityLevel::Excelente);
        assert_eq!(QualityLevel::from_score(1.0).unwrap(), QualityLevel::Excelente);
    }

    #[test]
    fn test_quality_level_out_of_range() {
        assert!(QualityLevel::from_score(1.5).is_err());
    }

    #[test]
    fn test_score_type_a_sets_quality_level() {
        let scorer = Scorer::new();
        let result = scorer
            .score("D1-Q1-PA1", "D1Q1", 1, 1, ScoringModality::TypeA, evidence_with_confidence(0.7))
            .unwrap();
        assert_eq!(result.quality_level.as_deref(), Some("satisfactorio"));
    }

    #[test]
    fn test_score_type_b_has_no_quality_level() {
        let scorer = Scorer::new();
        let result = scorer
            .score("D1-Q1-PA1", "D1Q1", 1, 1, ScoringModality::TypeB, evidence_with_confidence(0.55))
            .unwrap();
        assert!(result.quality_level.is_none());
        assert!((result.score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_score_uses_posterior_over_mean_confidence() {
        let scorer = Scorer::new();
        let mut evidence = evidence_with_confidence(0.2);
        evidence.posterior = Some(0.9);
        let result = scorer.score("D1-Q1-PA1", "D1Q1", 1, 1, ScoringModality::TypeB, evidence).unwrap();
        assert!((result.score - 0.9).abs() < 1e-9);
    }
}
