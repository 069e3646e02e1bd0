//! Core domain models for the assessment pipeline.
//!
//! Pure data types with no I/O dependencies: the normalized input document,
//! the strategic chunk, evidence/probative-test types, and the score tiers
//! produced by the scoring and aggregation stages.

pub mod chunk;
pub mod document;
pub mod evidence;
pub mod tiers;

pub use chunk::{
    ArgumentativeRole, CausalEdge, Chunk, ChunkBuilder, ChunkGraph, Provenance, TemporalMarker,
    DIMENSION_COUNT, POLICY_AREA_COUNT, TOTAL_CELLS,
};
pub use document::{DocumentMetadata, PlanDocument};
pub use evidence::{Evidence, MethodOutput, ProbativeTest, TestVariant};
pub use tiers::{AreaScore, ClusterScore, DimensionScore, DispersionPenalty, MacroScore, ScoredResult};
