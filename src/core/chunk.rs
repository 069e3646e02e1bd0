//! The strategic chunk: the unit the rest of the pipeline scores against.
//!
//! A document is partitioned into exactly ten policy areas times six
//! dimensions (sixty cells); each cell becomes one [`Chunk`]. Chunks carry
//! their own causal and temporal annotations because later phases never
//! re-read the source document — everything a method needs must already be
//! on the chunk.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{ChunkingError, Result};

/// Number of policy areas in the fixed taxonomy.
pub const POLICY_AREA_COUNT: usize = 10;
/// Number of dimensions in the fixed taxonomy.
pub const DIMENSION_COUNT: usize = 6;
/// Total number of chunks a sealed [`ChunkGraph`] must contain.
pub const TOTAL_CELLS: usize = POLICY_AREA_COUNT * DIMENSION_COUNT;
/// Minimum acceptable provenance completeness ratio before a chunk is
/// considered usable evidence.
pub const REQUIRED_PROVENANCE_COMPLETENESS: f64 = 1.0;

/// Where a chunk's text came from in the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// First page the chunk's text appears on (1-based).
    pub page_start: u32,
    /// Last page the chunk's text appears on (1-based, inclusive).
    pub page_end: u32,
    /// Byte offset range into the normalized source document.
    pub byte_range: Range<usize>,
    /// Fraction of the chunk's text that could be traced back to a source
    /// page/offset pair. `1.0` means every character is accounted for.
    pub completeness: f64,
}

impl Provenance {
    /// Builds provenance for text that was fully traced to the source.
    #[must_use]
    pub fn complete(page_start: u32, page_end: u32, byte_range: Range<usize>) -> Self {
        Self {
            page_start,
            page_end,
            byte_range,
            completeness: 1.0,
        }
    }

    /// Returns `true` if completeness meets the required gate.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completeness >= REQUIRED_PROVENANCE_COMPLETENESS
    }
}

/// A directed causal claim extracted from a chunk's text, e.g. "investment
/// in X leads to reduction in Y".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEdge {
    /// Source concept of the causal claim.
    pub cause: String,
    /// Target concept of the causal claim.
    pub effect: String,
    /// Connective text that signaled the relation (e.g. "conduce a").
    pub connective: String,
    /// Byte offset within the chunk where the connective was found.
    pub offset: usize,
}

/// A temporal marker found in a chunk (a year, a quarter, a named period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalMarker {
    /// Raw matched text (e.g. "2024-2027").
    pub text: String,
    /// Byte offset within the chunk.
    pub offset: usize,
    /// Parsed start year, if resolvable.
    pub year_start: Option<i32>,
    /// Parsed end year, if resolvable.
    pub year_end: Option<i32>,
}

/// The rhetorical role a chunk plays in the plan's argument structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentativeRole {
    /// States a problem or diagnosis.
    Diagnosis,
    /// States a goal or target.
    Objective,
    /// Describes a planned action or program.
    Intervention,
    /// States an expected or measured outcome.
    Outcome,
    /// Provides budget or resource commitments.
    Resourcing,
    /// Text that does not fit the other roles (boilerplate, headers).
    Unclassified,
}

/// One policy-area x dimension cell of a segmented plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier, `PA{n}-DIM{n}` for the owning cell.
    pub id: String,
    /// Policy area index, `1..=10`.
    pub policy_area_id: u8,
    /// Dimension index, `1..=6`.
    pub dimension_id: u8,
    /// Normalized text content of this cell.
    pub content: String,
    /// Dense embedding vector, populated during phase 1.
    pub embedding: Vec<f32>,
    /// Source provenance.
    pub provenance: Provenance,
    /// Causal claims found in this chunk's text.
    pub causal_edges: Vec<CausalEdge>,
    /// Temporal markers found in this chunk's text.
    pub temporal_markers: Vec<TemporalMarker>,
    /// Dominant argumentative role of the chunk's text.
    pub role: ArgumentativeRole,
}

impl Chunk {
    /// Builds the cell id `PA{n}-DIM{n}` from the `(policy_area, dimension)` pair.
    #[must_use]
    pub fn cell_id(policy_area_id: u8, dimension_id: u8) -> String {
        format!("PA{policy_area_id}-DIM{dimension_id}")
    }

    /// Returns the number of characters in this chunk's content.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.chars().count()
    }

    /// Returns `true` if the chunk has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Validates the cell coordinates and provenance completeness of a
    /// single chunk. Does not check cross-chunk invariants (cell coverage,
    /// ordering) — see [`ChunkGraph::seal`] for that.
    pub fn validate(&self) -> Result<()> {
        if !(1..=u8::try_from(POLICY_AREA_COUNT).unwrap_or(u8::MAX)).contains(&self.policy_area_id) {
            return Err(ChunkingError::InvalidConfig {
                reason: format!("policy_area_id {} out of range", self.policy_area_id),
            }
            .into());
        }
        if !(1..=u8::try_from(DIMENSION_COUNT).unwrap_or(u8::MAX)).contains(&self.dimension_id) {
            return Err(ChunkingError::InvalidConfig {
                reason: format!("dimension_id {} out of range", self.dimension_id),
            }
            .into());
        }
        if !self.provenance.is_complete() {
            return Err(ChunkingError::ProvenanceIncomplete {
                chunk_id: self.id.clone(),
                actual: self.provenance.completeness,
                required: REQUIRED_PROVENANCE_COMPLETENESS,
            }
            .into());
        }
        Ok(())
    }
}

/// Fluent builder for [`Chunk`], mirroring the chunking module's builder
/// idiom so callers never hand-construct a `Chunk` field by field.
#[derive(Debug, Default)]
pub struct ChunkBuilder {
    policy_area_id: u8,
    dimension_id: u8,
    content: String,
    embedding: Vec<f32>,
    provenance: Option<Provenance>,
    causal_edges: Vec<CausalEdge>,
    temporal_markers: Vec<TemporalMarker>,
    role: ArgumentativeRole,
}

impl Default for ArgumentativeRole {
    fn default() -> Self {
        Self::Unclassified
    }
}

impl ChunkBuilder {
    /// Starts a new builder for the given cell.
    #[must_use]
    pub fn new(policy_area_id: u8, dimension_id: u8) -> Self {
        Self {
            policy_area_id,
            dimension_id,
            ..Self::default()
        }
    }

    /// Sets the chunk's text content.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the chunk's embedding vector.
    #[must_use]
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Sets the chunk's provenance.
    #[must_use]
    pub fn provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Appends a causal edge.
    #[must_use]
    pub fn causal_edge(mut self, edge: CausalEdge) -> Self {
        self.causal_edges.push(edge);
        self
    }

    /// Appends a temporal marker.
    #[must_use]
    pub fn temporal_marker(mut self, marker: TemporalMarker) -> Self {
        self.temporal_markers.push(marker);
        self
    }

    /// Sets the dominant argumentative role.
    #[must_use]
    pub const fn role(mut self, role: ArgumentativeRole) -> Self {
        self.role = role;
        self
    }

    /// Finishes the builder, validating the resulting chunk.
    pub fn build(self) -> Result<Chunk> {
        let provenance = self.provenance.ok_or_else(|| ChunkingError::InvalidConfig {
            reason: "chunk built without provenance".to_string(),
        })?;
        let chunk = Chunk {
            id: Chunk::cell_id(self.policy_area_id, self.dimension_id),
            policy_area_id: self.policy_area_id,
            dimension_id: self.dimension_id,
            content: self.content,
            embedding: self.embedding,
            provenance,
            causal_edges: self.causal_edges,
            temporal_markers: self.temporal_markers,
            role: self.role,
        };
        chunk.validate()?;
        Ok(chunk)
    }
}

/// An immutable, complete set of chunks for one document.
///
/// `ChunkGraph::seal` is the only way to produce one; there is no public
/// mutator afterward, matching the "immutable thereafter" invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkGraph {
    chunks: Vec<Chunk>,
}

impl ChunkGraph {
    /// Seals a vector of chunks into an immutable graph, checking full cell
    /// coverage (every `(policy_area, dimension)` pair exactly once) and
    /// deterministic `(policy_area, dimension)` ordering.
    pub fn seal(mut chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.len() != TOTAL_CELLS {
            return Err(ChunkingError::CellCountMismatch {
                expected: TOTAL_CELLS,
                actual: chunks.len(),
            }
            .into());
        }
        for chunk in &chunks {
            chunk.validate()?;
        }
        chunks.sort_by_key(|c| (c.policy_area_id, c.dimension_id));
        let mut seen = std::collections::HashSet::with_capacity(TOTAL_CELLS);
        for chunk in &chunks {
            if !seen.insert((chunk.policy_area_id, chunk.dimension_id)) {
                return Err(ChunkingError::InvalidConfig {
                    reason: format!("duplicate cell {}", chunk.id),
                }
                .into());
            }
        }
        Ok(Self { chunks })
    }

    /// Returns all chunks in canonical `(policy_area, dimension)` order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Looks up the chunk for a given cell.
    #[must_use]
    pub fn cell(&self, policy_area_id: u8, dimension_id: u8) -> Option<&Chunk> {
        self.chunks
            .iter()
            .find(|c| c.policy_area_id == policy_area_id && c.dimension_id == dimension_id)
    }

    /// Returns all chunks belonging to a policy area, in dimension order.
    #[must_use]
    pub fn policy_area(&self, policy_area_id: u8) -> Vec<&Chunk> {
        self.chunks.iter().filter(|c| c.policy_area_id == policy_area_id).collect()
    }
}
