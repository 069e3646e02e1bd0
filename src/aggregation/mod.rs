//! The aggregation cascade: micro-question scores roll up through
//! dimension-area cells, policy areas, clusters, and finally one macro
//! score, each tier docked by its own dispersion penalty and scanned for
//! contradictions among its members.

pub mod contradiction;
pub mod dispersion;

use std::collections::BTreeMap;

use crate::core::{AreaScore, ClusterScore, DimensionScore, MacroScore, ScoredResult, DIMENSION_COUNT, POLICY_AREA_COUNT};
use crate::error::{AggregationError, Result};
use contradiction::ScoredMember;

/// The four policy clusters and the policy areas each one contains. Chosen
/// as the Open Question resolution recorded in `DESIGN.md`: a fixed,
/// roughly-even 3/3/2/2 split absent an externally supplied cluster map.
pub const CLUSTERS: [(u8, &str, &[u8]); 4] = [
    (1, "social", &[1, 2, 3]),
    (2, "economic", &[4, 5, 6]),
    (3, "institutional", &[7, 8]),
    (4, "environmental", &[9, 10]),
];

fn cluster_for_policy_area(policy_area_id: u8) -> Option<(u8, &'static str)> {
    CLUSTERS
        .iter()
        .find(|(_, _, members)| members.contains(&policy_area_id))
        .map(|&(id, name, _)| (id, name))
}

fn weighted_mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Aggregates micro-question scores into one [`DimensionScore`] per
/// `(policy_area, dimension)` cell present in `results`.
///
/// # Errors
///
/// Returns an error if dispersion computation encounters non-finite scores.
pub fn aggregate_dimensions(results: &[ScoredResult]) -> Result<Vec<DimensionScore>> {
    let mut by_cell: BTreeMap<(u8, u8), Vec<&ScoredResult>> = BTreeMap::new();
    for result in results {
        by_cell.entry((result.policy_area_id, result.dimension_id)).or_default().push(result);
    }

    let mut scores = Vec::with_capacity(by_cell.len());
    for ((policy_area_id, dimension_id), members) in by_cell {
        if members.is_empty() {
            return Err(AggregationError::EmptyTier {
                tier: "dimension".to_string(),
                key: format!("PA{policy_area_id}-DIM{dimension_id}"),
            }
            .into());
        }
        let member_scores: Vec<f64> = members.iter().map(|m| m.score).collect();
        let dispersion = dispersion::compute(&format!("PA{policy_area_id}-DIM{dimension_id}"), &member_scores)?;
        let mean = weighted_mean(&member_scores);
        let scored_members: Vec<ScoredMember<'_>> = members
            .iter()
            .map(|m| ScoredMember {
                id: &m.question_global_id,
                score: m.score,
            })
            .collect();
        scores.push(DimensionScore {
            policy_area_id,
            dimension_id,
            score: (mean - dispersion.combined).clamp(0.0, 1.0),
            dispersion,
            member_question_ids: members.iter().map(|m| m.question_global_id.clone()).collect(),
            contradictions: contradiction::scan(&scored_members),
        });
    }
    Ok(scores)
}

/// Aggregates dimension scores into one [`AreaScore`] per policy area.
///
/// # Errors
///
/// Returns an error if a policy area has no member dimensions, or
/// dispersion computation encounters non-finite scores.
pub fn aggregate_areas(dimensions: &[DimensionScore]) -> Result<Vec<AreaScore>> {
    let mut by_area: BTreeMap<u8, Vec<&DimensionScore>> = BTreeMap::new();
    for dimension in dimensions {
        by_area.entry(dimension.policy_area_id).or_default().push(dimension);
    }

    let mut scores = Vec::with_capacity(by_area.len());
    for (policy_area_id, members) in by_area {
        if members.is_empty() {
            return Err(AggregationError::EmptyTier {
                tier: "area".to_string(),
                key: format!("PA{policy_area_id}"),
            }
            .into());
        }
        let member_scores: Vec<f64> = members.iter().map(|m| m.score).collect();
        let dispersion = dispersion::compute(&format!("PA{policy_area_id}"), &member_scores)?;
        let mean = weighted_mean(&member_scores);
        let labels: Vec<String> = members.iter().map(|m| format!("DIM{}", m.dimension_id)).collect();
        let scored_members: Vec<ScoredMember<'_>> = members
            .iter()
            .zip(labels.iter())
            .map(|(m, label)| ScoredMember { id: label, score: m.score })
            .collect();
        scores.push(AreaScore {
            policy_area_id,
            score: (mean - dispersion.combined).clamp(0.0, 1.0),
            dispersion,
            member_dimension_ids: members.iter().map(|m| m.dimension_id).collect(),
            contradictions: contradiction::scan(&scored_members),
        });
    }
    Ok(scores)
}

/// Aggregates area scores into one [`ClusterScore`] per cluster in
/// [`CLUSTERS`].
///
/// # Errors
///
/// Returns an error if a cluster has no member areas, if an area maps to no
/// cluster, or if dispersion computation encounters non-finite scores.
pub fn aggregate_clusters(areas: &[AreaScore]) -> Result<Vec<ClusterScore>> {
    let mut by_cluster: BTreeMap<u8, Vec<&AreaScore>> = BTreeMap::new();
    for area in areas {
        let (cluster_id, _) = cluster_for_policy_area(area.policy_area_id).ok_or_else(|| AggregationError::RequiredColumnMissing {
            column: format!("cluster mapping for PA{}", area.policy_area_id),
        })?;
        by_cluster.entry(cluster_id).or_default().push(area);
    }

    let mut scores = Vec::with_capacity(by_cluster.len());
    for (&(cluster_id, cluster_name, _), members) in CLUSTERS.iter().filter_map(|entry| by_cluster.get(&entry.0).map(|m| (entry, m))) {
        if members.is_empty() {
            return Err(AggregationError::EmptyTier {
                tier: "cluster".to_string(),
                key: cluster_name.to_string(),
            }
            .into());
        }
        let member_scores: Vec<f64> = members.iter().map(|m| m.score).collect();
        let dispersion = dispersion::compute(cluster_name, &member_scores)?;
        let mean = weighted_mean(&member_scores);
        let labels: Vec<String> = members.iter().map(|m| format!("PA{}", m.policy_area_id)).collect();
        let scored_members: Vec<ScoredMember<'_>> = members
            .iter()
            .zip(labels.iter())
            .map(|(m, label)| ScoredMember { id: label, score: m.score })
            .collect();
        scores.push(ClusterScore {
            cluster_id,
            cluster_name: cluster_name.to_string(),
            score: (mean - dispersion.combined).clamp(0.0, 1.0),
            dispersion,
            member_policy_area_ids: members.iter().map(|m| m.policy_area_id).collect(),
            contradictions: contradiction::scan(&scored_members),
        });
    }
    Ok(scores)
}

/// Aggregates cluster scores into the single [`MacroScore`].
///
/// # Errors
///
/// Returns an error if `clusters` is empty, or dispersion computation
/// encounters non-finite scores.
pub fn aggregate_macro(clusters: &[ClusterScore]) -> Result<MacroScore> {
    if clusters.is_empty() {
        return Err(AggregationError::EmptyTier {
            tier: "macro".to_string(),
            key: "plan".to_string(),
        }
        .into());
    }
    let member_scores: Vec<f64> = clusters.iter().map(|c| c.score).collect();
    let dispersion = dispersion::compute("macro", &member_scores)?;
    let mean = weighted_mean(&member_scores);
    let labels: Vec<String> = clusters.iter().map(|c| c.cluster_name.clone()).collect();
    let scored_members: Vec<ScoredMember<'_>> = clusters
        .iter()
        .zip(labels.iter())
        .map(|(c, label)| ScoredMember { id: label, score: c.score })
        .collect();
    Ok(MacroScore {
        score: (mean - dispersion.combined).clamp(0.0, 1.0),
        dispersion,
        member_cluster_ids: clusters.iter().map(|c| c.cluster_id).collect(),
        contradictions: contradiction::scan(&scored_members),
    })
}

/// Returns `true` if `clusters` covers all [`POLICY_AREA_COUNT`] policy
/// areas across all [`DIMENSION_COUNT`] dimensions via `areas`/`dimensions`
/// — a sanity check run before a manifest is sealed.
#[must_use]
pub fn cascade_is_complete(dimensions: &[DimensionScore], areas: &[AreaScore], clusters: &[ClusterScore]) -> bool {
    dimensions.len() == POLICY_AREA_COUNT * DIMENSION_COUNT && areas.len() == POLICY_AREA_COUNT && clusters.len() == CLUSTERS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Evidence;

    fn result(pa: u8, dim: u8, id: &str, score: f64) -> ScoredResult {
        ScoredResult {
            question_global_id: id.to_string(),
            base_slot: id.to_string(),
            policy_area_id: pa,
            dimension_id: dim,
            score,
            quality_level: None,
            evidence: Evidence::default(),
        }
    }

    #[test]
    fn test_aggregate_dimensions_groups_by_cell() {
        let results = vec![result(1, 1, "q1", 0.8), result(1, 1, "q2", 0.6), result(1, 2, "q3", 0.5)];
        let dims = aggregate_dimensions(&results).unwrap();
        assert_eq!(dims.len(), 2);
    }

    #[test]
    fn test_aggregate_areas_groups_by_policy_area() {
        let dims = vec![
            DimensionScore {
                policy_area_id: 1,
                dimension_id: 1,
                score: 0.7,
                dispersion: Default::default(),
                member_question_ids: vec![],
                contradictions: vec![],
            },
            DimensionScore {
                policy_area_id: 1,
                dimension_id: 2,
                score: 0.5,
                dispersion: Default::default(),
                member_question_ids: vec![],
                contradictions: vec![],
            },
        ];
        let areas = aggregate_areas(&dims).unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].member_dimension_ids.len(), 2);
    }

    #[test]
    fn test_aggregate_clusters_maps_policy_areas() {
        let areas = vec![AreaScore {
            policy_area_id: 1,
            score: 0.8,
            dispersion: Default::default(),
            member_dimension_ids: vec![],
            contradictions: vec![],
        }];
        let clusters = aggregate_clusters(&areas).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, 1);
    }

    #[test]
    fn test_aggregate_macro_rejects_empty() {
        assert!(aggregate_macro(&[]).is_err());
    }

    #[test]
    fn test_aggregate_macro_combines_clusters() {
        let clusters = vec![
            ClusterScore {
                cluster_id: 1,
                cluster_name: "social".to_string(),
                score: 0.6,
                dispersion: Default::default(),
                member_policy_area_ids: vec![1],
                contradictions: vec![],
            },
            ClusterScore {
                cluster_id: 2,
                cluster_name: "economic".to_string(),
                score: 0.8,
                dispersion: Default::default(),
                member_policy_area_ids: vec![4],
                contradictions: vec![],
            },
        ];
        let macro_score = aggregate_macro(&clusters).unwrap();
        assert!(macro_score.score > 0.0);
    }

    #[test]
    fn test_cascade_is_complete_detects_gaps() {
        assert!(!cascade_is_complete(&[], &[], &[]));
    }
}
