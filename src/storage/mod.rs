//! Storage layer for the assessment pipeline.
//!
//! Provides persistent storage for pipeline runs using `SQLite`. Every
//! artifact — normalized document, sealed chunk graph, scored results,
//! rendered report, verification manifest — is persisted as a JSON blob
//! keyed by `run_id`, with transaction support for atomic writes.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageStats};

/// Default database file name.
pub const DEFAULT_DB_NAME: &str = "pdm-rs.db";

/// Default database path relative to project root.
pub const DEFAULT_DB_PATH: &str = ".pdm-rs/pdm-rs.db";
