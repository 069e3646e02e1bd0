//! Output formatting for CLI commands.
//!
//! Supports text, JSON, and NDJSON output formats.

use crate::orchestrator::{AnalysisReport, Proof};
use crate::storage::StorageStats;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
    /// Newline-delimited JSON (NDJSON) for streaming.
    Ndjson,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" | "stream" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Returns true if this format is a streaming format.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        matches!(self, Self::Ndjson)
    }
}

/// Formats storage statistics.
#[must_use]
pub fn format_status(stats: &StorageStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_status_text(stats),
        OutputFormat::Json | OutputFormat::Ndjson => format_json(stats),
    }
}

fn format_status_text(stats: &StorageStats) -> String {
    let mut output = String::new();
    output.push_str("PDM-RS Status\n");
    output.push_str("=============\n\n");
    let _ = writeln!(output, "  Runs:          {}", stats.run_count);
    let _ = writeln!(output, "  Sealed runs:   {}", stats.sealed_run_count);
    let _ = writeln!(output, "  Schema:        v{}", stats.schema_version);
    if let Some(size) = stats.db_size {
        let _ = writeln!(output, "  DB size:       {size} bytes");
    }
    output
}

/// Formats a completed run's analysis report and proof.
#[must_use]
pub fn format_run_result(report: &AnalysisReport, proof: &Proof, verified: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_run_result_text(report, proof, verified),
        OutputFormat::Json | OutputFormat::Ndjson => {
            #[derive(Serialize)]
            struct RunResult<'a> {
                report: &'a AnalysisReport,
                proof: &'a Proof,
                verified: bool,
            }
            format_json(&RunResult { report, proof, verified })
        }
    }
}

fn format_run_result_text(report: &AnalysisReport, proof: &Proof, verified: bool) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Document:        {}", report.document_id);
    let _ = writeln!(output, "Questions:       {}", report.total_questions);
    let _ = writeln!(output, "Dimensions:      {}", report.dimensions.len());
    let _ = writeln!(output, "Areas:           {}", report.areas.len());
    let _ = writeln!(output, "Clusters:        {}", report.clusters.len());
    let _ = writeln!(output, "Macro score:     {:.4}", report.macro_score.score);
    if !report.macro_score.contradictions.is_empty() {
        let _ = writeln!(output, "Contradictions:  {}", report.macro_score.contradictions.len());
        for finding in &report.macro_score.contradictions {
            let _ = writeln!(output, "  - {finding}");
        }
    }
    let _ = writeln!(output, "Manifest hash:   {}", proof.manifest_hash);
    let _ = writeln!(output, "Verified:        {}", if verified { "yes" } else { "no" });
    output
}

/// Formats the result of a standalone `verify` run.
#[must_use]
pub fn format_verify_result(run_id: &str, verified: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            format!("{run_id}: {}\n", if verified { "VERIFIED" } else { "FAILED" })
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            format_json(&serde_json::json!({ "run_id": run_id, "verified": verified }))
        }
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an error for output.
///
/// When format is JSON, returns a structured error object.
/// When format is Text, returns the error message string.
#[must_use]
pub fn format_error(error: &crate::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json | OutputFormat::Ndjson => {
            let (error_type, suggestion) = get_error_details(error);
            let json = serde_json::json!({
                "success": false,
                "error": {
                    "type": error_type,
                    "message": error.to_string(),
                    "suggestion": suggestion
                }
            });
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// Extracts error type and recovery suggestion from an error.
const fn get_error_details(error: &crate::Error) -> (&'static str, Option<&'static str>) {
    use crate::error::{
        AggregationError, BayesianError, CalibrationError, ChunkingError, CommandError, ExecutorError, IoError, ManifestError, ScoringError,
        StorageError,
    };

    match error {
        crate::Error::Storage(e) => match e {
            StorageError::NotInitialized => ("NotInitialized", Some("Run 'pdm-rs init' to initialize the database")),
            StorageError::RunNotFound { .. } => ("RunNotFound", Some("Run 'pdm-rs status' to see known runs")),
            StorageError::DocumentNotFound { .. } => ("DocumentNotFound", None),
            StorageError::ChunkNotFound { .. } => ("ChunkNotFound", None),
            StorageError::ScoredResultNotFound { .. } => ("ScoredResultNotFound", None),
            StorageError::Database(_) => ("DatabaseError", None),
            StorageError::Migration(_) => ("MigrationError", None),
            StorageError::Transaction(_) => ("TransactionError", None),
            StorageError::Serialization(_) => ("SerializationError", None),
        },
        crate::Error::Io(e) => match e {
            IoError::FileNotFound { .. } => ("FileNotFound", Some("Verify the file path exists")),
            IoError::ReadFailed { .. } => ("ReadError", None),
            IoError::WriteFailed { .. } => ("WriteError", None),
            IoError::MmapFailed { .. } => ("MemoryMapError", None),
            IoError::DirectoryFailed { .. } => ("DirectoryError", None),
            IoError::PathTraversal { .. } => ("PathTraversalDenied", Some("Path traversal outside allowed directory is not permitted")),
            IoError::Generic(_) => ("IoError", None),
        },
        crate::Error::Chunking(e) => match e {
            ChunkingError::InvalidUtf8 { .. } => ("InvalidUtf8", None),
            ChunkingError::ChunkTooLarge { .. } => ("ChunkTooLarge", None),
            ChunkingError::InvalidConfig { .. } => ("InvalidConfig", None),
            ChunkingError::OverlapTooLarge { .. } => ("OverlapTooLarge", None),
            ChunkingError::ParallelFailed { .. } => ("ParallelError", None),
            ChunkingError::CellCountMismatch { .. } => ("CellCountMismatch", Some("The input document could not be partitioned into a complete grid")),
            ChunkingError::ProvenanceIncomplete { .. } => ("ProvenanceIncomplete", Some("Set allow_partial_provenance in the run config to tolerate this")),
            ChunkingError::Regex(_) => ("RegexError", None),
            ChunkingError::UnknownStrategy { .. } => ("UnknownStrategy", None),
        },
        crate::Error::Calibration(e) => match e {
            CalibrationError::MissingRequired { .. } => ("MissingCalibration", Some("Add a calibration entry for this method or remove it from the catalog")),
            CalibrationError::MethodNotCatalogued { .. } => ("MethodNotCatalogued", None),
            CalibrationError::InvalidWeights { .. } => ("InvalidWeights", None),
            CalibrationError::DuplicateMethod { .. } => ("DuplicateMethod", None),
            CalibrationError::NotLoaded => ("RegistryNotLoaded", None),
        },
        crate::Error::Executor(e) => match e {
            ExecutorError::UnknownSlot { .. } => ("UnknownSlot", None),
            ExecutorError::MethodNotCatalogued { .. } => ("MethodNotCatalogued", None),
            ExecutorError::ArgRoutingFailed { .. } => ("ArgRoutingFailed", None),
            ExecutorError::PhaseTimeout { .. } => ("PhaseTimeout", Some("Raise the phase's timeout budget in the run config")),
            ExecutorError::CircuitOpen { .. } => ("CircuitOpen", None),
            ExecutorError::NoChunksRouted { .. } => ("NoChunksRouted", None),
        },
        crate::Error::Bayesian(e) => match e {
            BayesianError::ParameterOutOfRange { .. } => ("ParameterOutOfRange", None),
            BayesianError::InvalidPrior(_) => ("InvalidPrior", None),
            BayesianError::DidNotConverge { .. } => ("DidNotConverge", None),
            BayesianError::Timeout { .. } => ("BayesianTimeout", None),
        },
        crate::Error::Scoring(e) => match e {
            ScoringError::UnknownModality(_) => ("UnknownModality", None),
            ScoringError::NoMatchingLevel { .. } => ("NoMatchingLevel", None),
            ScoringError::ScoreOutOfRange(_) => ("ScoreOutOfRange", None),
        },
        crate::Error::Aggregation(e) => match e {
            AggregationError::RequiredColumnMissing { .. } => ("RequiredColumnMissing", None),
            AggregationError::EmptyTier { .. } => ("EmptyTier", None),
            AggregationError::NonFiniteDispersion { .. } => ("NonFiniteDispersion", None),
        },
        crate::Error::Manifest(e) => match e {
            ManifestError::HashMismatch { .. } => ("HashMismatch", Some("The artifact was modified after the manifest was sealed")),
            ManifestError::SignatureInvalid => ("SignatureInvalid", Some("The manifest was tampered with or signed with a different key")),
            ManifestError::AlreadySealed => ("AlreadySealed", None),
            ManifestError::NotSealed => ("NotSealed", None),
        },
        crate::Error::Command(e) => match e {
            CommandError::UnknownCommand(_) => ("UnknownCommand", None),
            CommandError::InvalidArgument(_) => ("InvalidArgument", None),
            CommandError::MissingArgument(_) => ("MissingArgument", None),
            CommandError::ExecutionFailed(_) => ("ExecutionFailed", None),
            CommandError::Cancelled => ("Cancelled", None),
            CommandError::OutputFormat(_) => ("OutputFormatError", None),
        },
        crate::Error::InvalidState { .. } => ("InvalidState", None),
        crate::Error::Config { .. } => ("ConfigError", Some("Check the run config JSON for missing or malformed fields")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_output_format_ndjson() {
        assert_eq!(OutputFormat::parse("ndjson"), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("jsonl"), OutputFormat::Ndjson);
        assert!(OutputFormat::Ndjson.is_streaming());
        assert!(!OutputFormat::Json.is_streaming());
    }

    #[test]
    fn test_format_status() {
        let stats = StorageStats { run_count: 2, sealed_run_count: 1, schema_version: 1, db_size: Some(4096) };

        let text = format_status(&stats, OutputFormat::Text);
        assert!(text.contains("Runs:          2"));
        assert!(text.contains("Sealed runs:   1"));
        assert!(text.contains("DB size:"));

        let json = format_status(&stats, OutputFormat::Json);
        assert!(json.contains("\"run_count\": 2"));
    }

    #[test]
    fn test_format_status_no_db_size() {
        let stats = StorageStats { run_count: 0, sealed_run_count: 0, schema_version: 1, db_size: None };
        let text = format_status(&stats, OutputFormat::Text);
        assert!(!text.contains("DB size:"));
    }

    #[test]
    fn test_format_verify_result() {
        let text = format_verify_result("run-1", true, OutputFormat::Text);
        assert!(text.contains("VERIFIED"));
        let json = format_verify_result("run-1", false, OutputFormat::Json);
        assert!(json.contains("\"verified\": false"));
    }
}
