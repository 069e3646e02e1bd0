//! The strategic chunker: splits a normalized plan document into exactly
//! sixty policy-area x dimension cells.
//!
//! Grounded on the teacher's `SemanticChunker` boundary search (paragraph >
//! sentence > word > character, in priority order) and `ParallelChunker`'s
//! segment-then-merge pattern: the document is first partitioned into ten
//! roughly-equal top-level segments (one per policy area) by boundary
//! search, then each segment is further partitioned into six dimension
//! sub-cells the same way, with embedding and annotation extraction run in
//! bounded parallel over the sixty resulting cells via `rayon`.

use std::sync::Arc;

use rayon::prelude::*;
use regex::Regex;

use crate::core::{ArgumentativeRole, CausalEdge, Chunk, ChunkBuilder, ChunkGraph, PlanDocument, Provenance, TemporalMarker, DIMENSION_COUNT, POLICY_AREA_COUNT};
use crate::embedding::Embedder;
use crate::error::{ChunkingError, Result};
use crate::io::find_char_boundary;

/// Minimum search window, in characters, looked back from a target split
/// point for a natural boundary before falling back to a raw character cut.
const BOUNDARY_SEARCH_FRACTION: usize = 5;

/// Finds the best split boundary at or before `target_pos` in `text`.
/// Prefers paragraph breaks, then sentence breaks, then word breaks, then
/// falls back to a raw (but UTF-8-safe) character boundary.
fn find_best_boundary(text: &str, target_pos: usize, window: usize) -> usize {
    if target_pos >= text.len() {
        return text.len();
    }
    let search_start = find_char_boundary(text, target_pos.saturating_sub(window / BOUNDARY_SEARCH_FRACTION.max(1)));
    let search_end = find_char_boundary(text, target_pos.min(text.len()));
    if search_start >= search_end {
        return find_char_boundary(text, target_pos);
    }
    let region = &text[search_start..search_end];

    if let Some(pos) = region.rfind("\n\n") {
        return search_start + pos + 2;
    }
    if let Some(pos) = region.rfind('\n') {
        return search_start + pos + 1;
    }
    for (i, c) in region.char_indices().rev() {
        if matches!(c, '.' | '!' | '?') {
            let next = search_start + i + c.len_utf8();
            if next >= text.len() || text[next..].starts_with(' ') || text[next..].starts_with('\n') {
                return next;
            }
        }
    }
    if let Some(pos) = region.rfind(' ') {
        return search_start + pos + 1;
    }
    find_char_boundary(text, target_pos)
}

/// Splits `text` into exactly `n` contiguous, boundary-respecting segments.
fn split_into_segments(text: &str, n: usize) -> Vec<std::ops::Range<usize>> {
    if n == 0 || text.is_empty() {
        return vec![0..text.len(); n];
    }
    let target_size = text.len().div_ceil(n);
    let mut segments = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        if i == n - 1 {
            segments.push(start..text.len());
            break;
        }
        let target_end = (start + target_size).min(text.len());
        let end = find_best_boundary(text, target_end, target_size).max(start);
        segments.push(start..end);
        start = end;
    }
    while segments.len() < n {
        segments.push(text.len()..text.len());
    }
    segments
}

static CAUSAL_CONNECTIVES: &[&str] = &["conduce a", "genera", "produce", "resulta en", "da lugar a", "conlleva a"];
static YEAR_PATTERN: &str = r"\b(19|20)\d{2}\b";

fn extract_causal_edges(content: &str) -> Vec<CausalEdge> {
    let mut edges = Vec::new();
    for connective in CAUSAL_CONNECTIVES {
        if let Some(offset) = content.to_lowercase().find(connective) {
            let before = content[..offset].trim();
            let after = content[offset + connective.len()..].trim();
            let cause = before.split_whitespace().rev().take(5).collect::<Vec<_>>().into_iter().rev().collect::<Vec<_>>().join(" ");
            let effect = after.split_whitespace().take(5).collect::<Vec<_>>().join(" ");
            if !cause.is_empty() && !effect.is_empty() {
                edges.push(CausalEdge {
                    cause,
                    effect,
                    connective: (*connective).to_string(),
                    offset,
                });
            }
        }
    }
    edges
}

fn extract_temporal_markers(content: &str, year_re: &Regex) -> Vec<TemporalMarker> {
    year_re
        .find_iter(content)
        .filter_map(|m| {
            let year: i32 = m.as_str().parse().ok()?;
            Some(TemporalMarker {
                text: m.as_str().to_string(),
                offset: m.start(),
                year_start: Some(year),
                year_end: None,
            })
        })
        .collect()
}

fn classify_role(content: &str) -> ArgumentativeRole {
    let lower = content.to_lowercase();
    if lower.contains("diagnostico") || lower.contains("problema") {
        ArgumentativeRole::Diagnosis
    } else if lower.contains("objetivo") || lower.contains("meta") {
        ArgumentativeRole::Objective
    } else if lower.contains("presupuesto") || lower.contains("recursos") {
        ArgumentativeRole::Resourcing
    } else if lower.contains("resultado") || lower.contains("indicador") {
        ArgumentativeRole::Outcome
    } else if lower.contains("programa") || lower.contains("estrategia") || lower.contains("accion") {
        ArgumentativeRole::Intervention
    } else {
        ArgumentativeRole::Unclassified
    }
}

/// Partitions a [`PlanDocument`] into a sealed [`ChunkGraph`] of exactly
/// [`crate::core::TOTAL_CELLS`] chunks.
pub struct StrategicChunker {
    embedder: Arc<dyn Embedder>,
}

impl StrategicChunker {
    /// Builds a chunker using the given embedder.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Segments `document` into the fixed `(policy_area, dimension)` grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is empty, if a cell ends up with
    /// incomplete provenance, or if a constructed chunk fails validation.
    pub fn chunk(&self, document: &PlanDocument) -> Result<ChunkGraph> {
        if document.content.is_empty() {
            return Err(ChunkingError::InvalidConfig {
                reason: "cannot chunk an empty document".to_string(),
            }
            .into());
        }

        let year_re = Regex::new(YEAR_PATTERN).map_err(ChunkingError::from)?;
        let area_ranges = split_into_segments(&document.content, POLICY_AREA_COUNT);

        let cells: Vec<(u8, u8, std::ops::Range<usize>)> = area_ranges
            .iter()
            .enumerate()
            .flat_map(|(area_idx, area_range)| {
                let area_text = &document.content[area_range.clone()];
                let dim_ranges = split_into_segments(area_text, DIMENSION_COUNT);
                dim_ranges.into_iter().enumerate().map(move |(dim_idx, rel_range)| {
                    let absolute = (area_range.start + rel_range.start)..(area_range.start + rel_range.end);
                    (
                        u8::try_from(area_idx + 1).unwrap_or(u8::MAX),
                        u8::try_from(dim_idx + 1).unwrap_or(u8::MAX),
                        absolute,
                    )
                })
            })
            .collect();

        let chunks: Result<Vec<Chunk>> = cells
            .par_iter()
            .map(|(policy_area_id, dimension_id, range)| {
                let content = document.content[range.start..range.end].to_string();
                let embedding = self.embedder.embed(&content)?;
                let page_start = document.page_at(range.start);
                let page_end = document.page_at(range.end.saturating_sub(1).max(range.start));
                let provenance = Provenance::complete(page_start, page_end, range.clone());
                let causal_edges = extract_causal_edges(&content);
                let temporal_markers = extract_temporal_markers(&content, &year_re);
                let role = classify_role(&content);

                let mut builder = ChunkBuilder::new(*policy_area_id, *dimension_id)
                    .content(content)
                    .embedding(embedding)
                    .provenance(provenance)
                    .role(role);
                for edge in causal_edges {
                    builder = builder.causal_edge(edge);
                }
                for marker in temporal_markers {
                    builder = builder.temporal_marker(marker);
                }
                builder.build()
            })
            .collect();

        ChunkGraph::seal(chunks?)
    }
}
