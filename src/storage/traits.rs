//! Storage trait definition.
//!
//! Defines the interface for persisting one pipeline run's artifacts:
//! the normalized document, the sealed chunk graph, scored results, the
//! rendered report, and the sealed verification manifest. Implementations
//! handle storage of this state; all write operations are atomic where
//! appropriate. Per the ownership model, `Storage` is the sole owner of
//! persisted tiers and manifests — an in-process `Orchestrator` only holds
//! them transiently during a run.

use crate::core::PlanDocument;
use crate::core::{Chunk, ChunkGraph, ScoredResult};
use crate::error::Result;
use crate::manifest::VerificationManifest;
use crate::orchestrator::AnalysisReport;
use serde::Serialize;

/// Trait for persistent storage backends.
pub trait Storage: Send + Sync {
    /// Initializes storage (creates schema, runs migrations).
    ///
    /// Should be idempotent - safe to call multiple times.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation or migration fails.
    fn init(&mut self) -> Result<()>;

    /// Checks if storage is initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot be performed.
    fn is_initialized(&self) -> Result<bool>;

    /// Deletes all persisted runs and their artifacts, preserving schema.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn reset(&mut self) -> Result<()>;

    /// Registers a new run, creating its row if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn open_run(&mut self, run_id: &str) -> Result<()>;

    /// Lists all known run ids, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_runs(&self) -> Result<Vec<String>>;

    /// Deletes a run and every artifact associated with it.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn delete_run(&mut self, run_id: &str) -> Result<()>;

    /// Persists the normalized input document for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    fn save_document(&mut self, run_id: &str, document: &PlanDocument) -> Result<()>;

    /// Loads the normalized input document for a run, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read or deserialization fails.
    fn load_document(&self, run_id: &str) -> Result<Option<PlanDocument>>;

    /// Persists the sealed chunk graph for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    fn save_chunk_graph(&mut self, run_id: &str, graph: &ChunkGraph) -> Result<()>;

    /// Loads the sealed chunk graph for a run, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read or deserialization fails.
    fn load_chunk_graph(&self, run_id: &str) -> Result<Option<ChunkGraph>>;

    /// Looks up a single cell from a run's persisted chunk graph by policy
    /// area and dimension, without deserializing the full graph twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read or deserialization fails.
    fn load_chunk(&self, run_id: &str, policy_area_id: u8, dimension_id: u8) -> Result<Option<Chunk>> {
        Ok(self.load_chunk_graph(run_id)?.and_then(|graph| graph.cell(policy_area_id, dimension_id).cloned()))
    }

    /// Persists all scored micro-question results for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    fn save_scored_results(&mut self, run_id: &str, results: &[ScoredResult]) -> Result<()>;

    /// Loads all scored micro-question results for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read or deserialization fails.
    fn load_scored_results(&self, run_id: &str) -> Result<Vec<ScoredResult>>;

    /// Persists the rendered analysis report for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    fn save_report(&mut self, run_id: &str, report: &AnalysisReport) -> Result<()>;

    /// Loads the rendered analysis report for a run, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read or deserialization fails.
    fn load_report(&self, run_id: &str) -> Result<Option<AnalysisReport>>;

    /// Persists the (possibly unsealed) verification manifest for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    fn save_manifest(&mut self, run_id: &str, manifest: &VerificationManifest) -> Result<()>;

    /// Loads the verification manifest for a run, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read or deserialization fails.
    fn load_manifest(&self, run_id: &str) -> Result<Option<VerificationManifest>>;

    /// Gets storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if statistics cannot be gathered.
    fn stats(&self) -> Result<StorageStats>;
}

/// Storage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    /// Number of runs stored.
    pub run_count: usize,
    /// Number of runs with a sealed manifest.
    pub sealed_run_count: usize,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}
