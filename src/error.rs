//! Error types for the assessment pipeline.
//!
//! One `thiserror`-derived hierarchy composed of per-area sub-enums, plus an
//! `ErrorClass` taxonomy (contract violation / data integrity / timeout /
//! transient / configuration) used by the orchestrator to decide whether a
//! failure is retryable.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors (persisted artifacts, database operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Chunking-related errors (strategic segmentation).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Calibration catalog/registry errors.
    #[error("calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// Method executor errors.
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// Bayesian evidence engine errors.
    #[error("bayesian evidence error: {0}")]
    Bayesian(#[from] BayesianError),

    /// Scoring errors.
    #[error("scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Aggregation cascade errors.
    #[error("aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    /// Verification manifest errors.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Invalid state errors.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state.
        message: String,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Cross-cutting failure taxonomy, orthogonal to the leaf error type.
///
/// The orchestrator uses this (not the error's concrete type) to decide
/// whether a phase failure is retryable: `Transient` failures get a bounded
/// retry budget, everything else is fatal on first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A required invariant was violated by caller input or internal state.
    ContractViolation,
    /// Persisted or computed data failed an integrity check (hash mismatch,
    /// missing provenance, corrupt artifact).
    DataIntegrity,
    /// A phase or operation exceeded its allotted time budget.
    Timeout,
    /// A failure that may succeed if retried (lock contention, I/O hiccup).
    Transient,
    /// A required configuration value was missing, malformed, or out of range.
    ConfigurationError,
}

impl Error {
    /// Classifies this error for retry/severity decisions.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Config { .. } => ErrorClass::ConfigurationError,
            Self::Calibration(CalibrationError::MissingRequired { .. } | CalibrationError::MethodNotCatalogued { .. })
            | Self::Executor(ExecutorError::MethodNotCatalogued { .. })
            | Self::Chunking(ChunkingError::OverlapTooLarge { .. } | ChunkingError::InvalidConfig { .. }) => {
                ErrorClass::ContractViolation
            }
            Self::Calibration(CalibrationError::InvalidWeights { .. })
            | Self::Manifest(ManifestError::HashMismatch { .. } | ManifestError::SignatureInvalid)
            | Self::Aggregation(AggregationError::RequiredColumnMissing { .. })
            | Self::Chunking(ChunkingError::ProvenanceIncomplete { .. }) => ErrorClass::DataIntegrity,
            Self::Executor(ExecutorError::PhaseTimeout { .. }) | Self::Bayesian(BayesianError::Timeout { .. }) => {
                ErrorClass::Timeout
            }
            Self::Storage(StorageError::Database(_) | StorageError::Transaction(_))
            | Self::Io(IoError::ReadFailed { .. } | IoError::WriteFailed { .. }) => ErrorClass::Transient,
            _ => ErrorClass::ContractViolation,
        }
    }
}

/// Storage-specific errors for persisted artifacts.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Storage not initialized (init command not run).
    #[error("pipeline storage not initialized. Run: pdm-rs init")]
    NotInitialized,

    /// Run context not found in storage.
    #[error("run context not found: {run_id}")]
    RunNotFound {
        /// Run identifier that was not found.
        run_id: String,
    },

    /// Document not found by id or name.
    #[error("document not found: {identifier}")]
    DocumentNotFound {
        /// Document id or name that was not found.
        identifier: String,
    },

    /// Chunk not found by id.
    #[error("chunk not found: {id}")]
    ChunkNotFound {
        /// Chunk id that was not found.
        id: i64,
    },

    /// Scored result not found for a question.
    #[error("scored result not found: {question_id}")]
    ScoredResultNotFound {
        /// Question global id.
        question_id: String,
    },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Chunking-specific errors for strategic segmentation.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid UTF-8 encountered at specific byte offset.
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where invalid UTF-8 was found.
        offset: usize,
    },

    /// Chunk size exceeds maximum allowed.
    #[error("chunk size {size} exceeds maximum {max}")]
    ChunkTooLarge {
        /// Actual chunk size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },

    /// Parallel processing error.
    #[error("parallel processing failed: {reason}")]
    ParallelFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Did not produce exactly the required policy-area x dimension cells.
    #[error("expected {expected} chunks (policy_area x dimension), produced {actual}")]
    CellCountMismatch {
        /// Expected chunk count.
        expected: usize,
        /// Actual chunk count produced.
        actual: usize,
    },

    /// Provenance completeness fell below the required gate.
    #[error("provenance completeness {actual} below required {required} for chunk {chunk_id}")]
    ProvenanceIncomplete {
        /// Chunk identifier.
        chunk_id: String,
        /// Observed completeness ratio.
        actual: f64,
        /// Required completeness ratio.
        required: f64,
    },

    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),

    /// Unknown chunking strategy.
    #[error("unknown chunking strategy: {name}")]
    UnknownStrategy {
        /// Name of the unknown strategy.
        name: String,
    },
}

/// Calibration catalog/registry errors.
#[derive(Error, Debug)]
pub enum CalibrationError {
    /// Method referenced by the catalog or an executor has no calibration.
    #[error("method {method_id} requires calibration but none is registered")]
    MissingRequired {
        /// Fully-qualified method id.
        method_id: String,
    },

    /// A method participating in scoring is absent from the canonical catalog.
    #[error("method {method_id} is not present in the canonical catalog")]
    MethodNotCatalogued {
        /// Fully-qualified method id.
        method_id: String,
    },

    /// Calibration weights violate the monotonicity/bound constraints.
    #[error("invalid calibration weights for {method_id}: {reason}")]
    InvalidWeights {
        /// Fully-qualified method id.
        method_id: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Duplicate method id within a single catalog load.
    #[error("duplicate method id in catalog: {method_id}")]
    DuplicateMethod {
        /// Fully-qualified method id.
        method_id: String,
    },

    /// Registry was queried before `load` was called.
    #[error("calibration registry not loaded")]
    NotLoaded,
}

/// Method executor errors.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Executor for a `D{d}Q{q}` slot is missing from the registry.
    #[error("no executor registered for question slot {slot}")]
    UnknownSlot {
        /// The `D{d}Q{q}` slot identifier.
        slot: String,
    },

    /// A method invoked by an executor is not in the canonical catalog.
    #[error("executor referenced uncatalogued method {method_id}")]
    MethodNotCatalogued {
        /// Fully-qualified method id.
        method_id: String,
    },

    /// Argument routing failed to satisfy a method's parameter schema.
    #[error("argument routing failed for {method_id}: {reason}")]
    ArgRoutingFailed {
        /// Fully-qualified method id.
        method_id: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A phase exceeded its configured timeout.
    #[error("phase {phase} exceeded timeout of {budget_ms}ms")]
    PhaseTimeout {
        /// Phase name.
        phase: String,
        /// Configured timeout budget in milliseconds.
        budget_ms: u64,
    },

    /// Circuit breaker tripped after repeated failures for a method.
    #[error("circuit breaker open for method {method_id} after {failures} failures")]
    CircuitOpen {
        /// Fully-qualified method id.
        method_id: String,
        /// Observed consecutive failures.
        failures: u32,
    },

    /// No chunks were routed to an executor that requires at least one.
    #[error("no chunks routed to executor {slot}")]
    NoChunksRouted {
        /// The `D{d}Q{q}` slot identifier.
        slot: String,
    },
}

/// Bayesian evidence engine errors.
#[derive(Error, Debug)]
pub enum BayesianError {
    /// Sensitivity/specificity outside the valid `[0, 1]` range.
    #[error("probative test parameter out of range: {name}={value}")]
    ParameterOutOfRange {
        /// Parameter name (`sensitivity` or `specificity`).
        name: String,
        /// Observed value.
        value: f64,
    },

    /// Prior probability outside `[0, 1]`.
    #[error("prior probability {0} outside [0, 1]")]
    InvalidPrior(f64),

    /// Posterior computation did not converge within the iteration budget.
    #[error("posterior update did not converge after {iterations} iterations")]
    DidNotConverge {
        /// Iterations attempted.
        iterations: u32,
    },

    /// A bounded evidence update exceeded its time budget.
    #[error("evidence update timed out after {budget_ms}ms")]
    Timeout {
        /// Configured timeout budget in milliseconds.
        budget_ms: u64,
    },
}

/// Scoring errors.
#[derive(Error, Debug)]
pub enum ScoringError {
    /// Unknown scoring modality requested.
    #[error("unknown scoring modality: {0}")]
    UnknownModality(String),

    /// A discrete (`TYPE_A`) score fell outside the finite quality-level set.
    #[error("score {score} has no matching quality level")]
    NoMatchingLevel {
        /// The computed score.
        score: f64,
    },

    /// A continuous (`TYPE_B`) score fell outside `[0, 1]`.
    #[error("continuous score {0} outside [0, 1]")]
    ScoreOutOfRange(f64),
}

/// Aggregation cascade errors.
#[derive(Error, Debug)]
pub enum AggregationError {
    /// A column required by the aggregation's `group_by_keys` is absent.
    #[error("required column missing for aggregation: {column}")]
    RequiredColumnMissing {
        /// Missing column name.
        column: String,
    },

    /// A tier has no members to aggregate.
    #[error("no members to aggregate for tier {tier}: {key}")]
    EmptyTier {
        /// Tier name (dimension/area/cluster/macro).
        tier: String,
        /// Group key with no members.
        key: String,
    },

    /// Dispersion penalty computation received non-finite input.
    #[error("non-finite value encountered computing dispersion for {key}")]
    NonFiniteDispersion {
        /// Group key.
        key: String,
    },
}

/// Verification manifest errors.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A computed hash does not match the recorded one.
    #[error("hash mismatch for {artifact}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Artifact name (monolith, catalog, registry, ...).
        artifact: String,
        /// Expected hash (hex).
        expected: String,
        /// Actual computed hash (hex).
        actual: String,
    },

    /// HMAC signature verification failed.
    #[error("manifest signature invalid")]
    SignatureInvalid,

    /// Manifest was sealed twice.
    #[error("manifest already sealed")]
    AlreadySealed,

    /// Manifest was read before being sealed.
    #[error("manifest not yet sealed")]
    NotSealed,
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Path traversal security error.
    #[error("path traversal denied: {path}")]
    PathTraversal {
        /// Path that was denied.
        path: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Unknown command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// User cancelled operation.
    #[error("operation cancelled by user")]
    Cancelled,

    /// Output format error.
    #[error("output format error: {0}")]
    OutputFormat(String),
}

// Implement From traits for standard library and third-party errors.

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<regex::Error> for ChunkingError {
    fn from(err: regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(StorageError::Serialization(err.to_string()))
    }
}

impl From<std::string::FromUtf8Error> for ChunkingError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: err.utf8_error().valid_up_to(),
        }
    }
}

impl From<std::str::Utf8Error> for ChunkingError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: err.valid_up_to(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidState {
            message: "test error".to_string(),
        };
        assert_eq!(err.to_string(), "invalid state: test error");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::NotInitialized;
        assert_eq!(err.to_string(), "pipeline storage not initialized. Run: pdm-rs init");

        let err = StorageError::DocumentNotFound {
            identifier: "test-doc".to_string(),
        };
        assert_eq!(err.to_string(), "document not found: test-doc");
    }

    #[test]
    fn test_chunking_error_display() {
        let err = ChunkingError::InvalidUtf8 { offset: 42 };
        assert_eq!(err.to_string(), "invalid UTF-8 at byte offset 42");

        let err = ChunkingError::CellCountMismatch {
            expected: 60,
            actual: 58,
        };
        assert!(err.to_string().contains("60"));
    }

    #[test]
    fn test_calibration_error_display() {
        let err = CalibrationError::MissingRequired {
            method_id: "D1Q1.primary".to_string(),
        };
        assert!(err.to_string().contains("D1Q1.primary"));
    }

    #[test]
    fn test_error_class_config() {
        let err = Error::Config {
            message: "bad".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::ConfigurationError);
    }

    #[test]
    fn test_error_class_contract_violation() {
        let err: Error = CalibrationError::MethodNotCatalogued {
            method_id: "x".to_string(),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::ContractViolation);
    }

    #[test]
    fn test_error_class_data_integrity() {
        let err: Error = ManifestError::SignatureInvalid.into();
        assert_eq!(err.class(), ErrorClass::DataIntegrity);
    }

    #[test]
    fn test_error_class_timeout() {
        let err: Error = ExecutorError::PhaseTimeout {
            phase: "execution".to_string(),
            budget_ms: 5000,
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Timeout);
    }

    #[test]
    fn test_error_class_transient() {
        let err: Error = StorageError::Database("locked".to_string()).into();
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: Error = rusqlite_err.into();
        assert!(matches!(err, Error::Storage(StorageError::Database(_))));
    }

    #[test]
    fn test_error_from_regex() {
        #[allow(clippy::invalid_regex)]
        let regex_err = regex::Regex::new("[invalid").unwrap_err();
        let err: ChunkingError = regex_err.into();
        assert!(matches!(err, ChunkingError::Regex(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: StorageError = json_err.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_error_from_utf8() {
        let invalid_bytes: Vec<u8> = vec![0xff, 0xfe];
        let utf8_err = std::str::from_utf8(&invalid_bytes).unwrap_err();
        let err: ChunkingError = utf8_err.into();
        assert!(matches!(err, ChunkingError::InvalidUtf8 { .. }));
    }
}
