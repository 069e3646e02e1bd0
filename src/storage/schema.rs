//! Database schema definitions.
//!
//! Contains the SQL schema and migration logic for the assessment
//! pipeline's `SQLite` database. Every pipeline artifact (document, chunk
//! graph, scored results, report, manifest) is persisted as a JSON blob
//! keyed by `run_id` — the schema's job is durable storage and run
//! indexing, not relational decomposition of the domain model.

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// SQL schema for initial database setup.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- One row per pipeline run.
CREATE TABLE IF NOT EXISTS runs (
    run_id TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Normalized input document, keyed by run.
CREATE TABLE IF NOT EXISTS documents (
    run_id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    data TEXT NOT NULL,  -- JSON-serialized PlanDocument
    created_at INTEGER NOT NULL,
    FOREIGN KEY (run_id) REFERENCES runs(run_id) ON DELETE CASCADE
);

-- Sealed chunk graph (the sixty policy-area x dimension cells), keyed by run.
CREATE TABLE IF NOT EXISTS chunk_graphs (
    run_id TEXT PRIMARY KEY,
    data TEXT NOT NULL,  -- JSON-serialized ChunkGraph
    created_at INTEGER NOT NULL,
    FOREIGN KEY (run_id) REFERENCES runs(run_id) ON DELETE CASCADE
);

-- Scored micro-question results, keyed by run.
CREATE TABLE IF NOT EXISTS scored_results (
    run_id TEXT PRIMARY KEY,
    data TEXT NOT NULL,  -- JSON-serialized Vec<ScoredResult>
    created_at INTEGER NOT NULL,
    FOREIGN KEY (run_id) REFERENCES runs(run_id) ON DELETE CASCADE
);

-- The rendered analysis report, keyed by run.
CREATE TABLE IF NOT EXISTS reports (
    run_id TEXT PRIMARY KEY,
    macro_score REAL,
    data TEXT NOT NULL,  -- JSON-serialized AnalysisReport
    created_at INTEGER NOT NULL,
    FOREIGN KEY (run_id) REFERENCES runs(run_id) ON DELETE CASCADE
);

-- The sealed verification manifest, keyed by run.
CREATE TABLE IF NOT EXISTS manifests (
    run_id TEXT PRIMARY KEY,
    sealed INTEGER NOT NULL,
    data TEXT NOT NULL,  -- JSON-serialized VerificationManifest
    created_at INTEGER NOT NULL,
    FOREIGN KEY (run_id) REFERENCES runs(run_id) ON DELETE CASCADE
);
";

/// SQL to check if schema is initialized.
pub const CHECK_SCHEMA_SQL: &str = r"
SELECT COUNT(*) FROM sqlite_master
WHERE type='table' AND name='schema_info';
";

/// SQL to get schema version.
pub const GET_VERSION_SQL: &str = r"
SELECT value FROM schema_info WHERE key = 'version';
";

/// SQL to set schema version.
pub const SET_VERSION_SQL: &str = r"
INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);
";

/// Migrations from older schema versions. Empty today — the schema has
/// only ever had one version — but kept as a seam so a future artifact
/// addition does not require a destructive reset.
pub struct Migration {
    /// Version this migration upgrades from.
    pub from_version: u32,
    /// Version this migration upgrades to.
    pub to_version: u32,
    /// SQL statements to execute.
    pub sql: &'static str,
}

/// Available migrations.
pub const MIGRATIONS: &[Migration] = &[];

/// Gets migrations needed to upgrade from a version.
#[must_use]
pub fn get_migrations_from(current_version: u32) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| m.from_version >= current_version && m.to_version <= CURRENT_SCHEMA_VERSION)
        .collect()
}
