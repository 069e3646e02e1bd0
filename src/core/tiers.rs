//! Score records produced by the scoring and aggregation stages.
//!
//! Every tier here is a plain struct, never a map — resolved as an explicit
//! design decision recorded in `DESIGN.md` (a prior draft kept cluster
//! scores in a `HashMap<u8, ClusterScore>` in some call sites and a `Vec` in
//! others, which is the kind of inconsistency this crate refuses to ship).

use serde::{Deserialize, Serialize};

use crate::core::evidence::Evidence;

/// A single micro-question's scored result, in one modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Global question id, e.g. `"D3-Q07"`.
    pub question_global_id: String,
    /// Base executor slot, e.g. `"D3Q7"`.
    pub base_slot: String,
    /// Owning policy area, `1..=10`.
    pub policy_area_id: u8,
    /// Owning dimension, `1..=6`.
    pub dimension_id: u8,
    /// Final score in `[0, 1]`.
    pub score: f64,
    /// Discrete quality level label, present only for `TYPE_A` questions.
    pub quality_level: Option<String>,
    /// Accumulated evidence backing this score.
    pub evidence: Evidence,
}

/// Dispersion diagnostics computed over a tier's member scores: coefficient
/// of variation, maximum adjacent gap, and the Gini index, combined into a
/// single penalty subtracted from the tier's weighted mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DispersionPenalty {
    /// Coefficient of variation of member scores.
    pub coefficient_of_variation: f64,
    /// Largest gap between adjacent sorted member scores.
    pub max_gap: f64,
    /// Gini index of member scores.
    pub gini: f64,
    /// Combined penalty actually subtracted from the weighted mean.
    pub combined: f64,
}

/// Aggregate score for one `(policy_area, dimension)` cell, over its member
/// micro-questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Policy area, `1..=10`.
    pub policy_area_id: u8,
    /// Dimension, `1..=6`.
    pub dimension_id: u8,
    /// Weighted mean minus dispersion penalty, in `[0, 1]`.
    pub score: f64,
    /// Dispersion diagnostics for this cell's member questions.
    pub dispersion: DispersionPenalty,
    /// Global ids of member questions.
    pub member_question_ids: Vec<String>,
    /// Contradiction findings detected among this cell's members.
    pub contradictions: Vec<String>,
}

/// Aggregate score for one policy area, over its six member dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaScore {
    /// Policy area, `1..=10`.
    pub policy_area_id: u8,
    /// Weighted mean minus dispersion penalty, in `[0, 1]`.
    pub score: f64,
    /// Dispersion diagnostics across the six member dimensions.
    pub dispersion: DispersionPenalty,
    /// Member dimension ids (always `1..=6`, kept explicit for symmetry
    /// with the other tiers and for contradiction-scan traceability).
    pub member_dimension_ids: Vec<u8>,
    /// Contradiction findings detected among this area's member dimensions.
    pub contradictions: Vec<String>,
}

/// Aggregate score for one cluster, over its member policy areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterScore {
    /// Cluster id, `1..=4`.
    pub cluster_id: u8,
    /// Human-readable cluster name.
    pub cluster_name: String,
    /// Weighted mean minus dispersion penalty, in `[0, 1]`.
    pub score: f64,
    /// Dispersion diagnostics across member policy areas.
    pub dispersion: DispersionPenalty,
    /// Member policy area ids.
    pub member_policy_area_ids: Vec<u8>,
    /// Contradiction findings detected among this cluster's member areas.
    pub contradictions: Vec<String>,
}

/// The single overall score for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroScore {
    /// Weighted mean minus dispersion penalty, in `[0, 1]`.
    pub score: f64,
    /// Dispersion diagnostics across the four clusters.
    pub dispersion: DispersionPenalty,
    /// Member cluster ids (always `1..=4`).
    pub member_cluster_ids: Vec<u8>,
    /// Contradiction findings detected among the four clusters.
    pub contradictions: Vec<String>,
}
