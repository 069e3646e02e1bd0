//! # PDM-RS
//!
//! Assessment pipeline for Colombian municipal development plans (PDMs).
//!
//! PDM-RS ingests a normalized plan document and runs it through strategic
//! chunking, an eight-layer method calibration engine, Bayesian evidence
//! scoring, and a multi-level aggregation cascade, producing a hierarchical
//! quality assessment backed by a cryptographically verifiable manifest.
//!
//! ## Pipeline
//!
//! - **Chunking**: partitions a normalized document into the fixed
//!   policy-area by dimension grid of cells, with causal and argumentative
//!   annotation.
//! - **Calibration**: fuses per-method raw signals through a Choquet
//!   integral using registered, catalog-validated calibrations.
//! - **Bayesian evidence**: sequential posterior updates over probative
//!   tests collected during method execution.
//! - **Aggregation cascade**: dimension to area to cluster to macro score,
//!   with dispersion penalties and contradiction detection at each tier.
//! - **`SQLite` storage**: persists every run's document, chunk graph,
//!   scored results, report, and sealed manifest.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod aggregation;
pub mod bayesian;
pub mod calibration;
pub mod catalog;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod executor;
pub mod executors;
pub mod io;
pub mod manifest;
pub mod orchestrator;
pub mod scoring;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, ChunkGraph, Evidence, PlanDocument, ScoredResult};

// Re-export storage types
pub use storage::{DEFAULT_DB_PATH, SqliteStorage, Storage};

// Re-export chunking types
pub use chunking::StrategicChunker;

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export pipeline types
pub use config::ExecutionConfig;
pub use orchestrator::{AnalysisReport, Orchestrator, Proof};

// Re-export embedding types
pub use embedding::{create_embedder, Embedder, DEFAULT_DIMENSIONS};

// Re-export manifest types
pub use manifest::VerificationManifest;
