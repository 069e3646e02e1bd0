//! `SQLite` storage implementation.
//!
//! Provides persistent storage using `SQLite` with proper transaction
//! management. Every artifact is a JSON blob keyed by `run_id`; this
//! backend's job is durable, queryable storage of runs, not relational
//! decomposition of the domain model.

// SQLite stores all integers as i64. These casts are intentional and safe
// because we only store non-negative values that fit in usize.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::core::{Chunk, ChunkGraph, PlanDocument, ScoredResult};
use crate::error::{Result, StorageError};
use crate::manifest::VerificationManifest;
use crate::orchestrator::AnalysisReport;
use crate::storage::schema::{CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL};
use crate::storage::traits::{Storage, StorageStats};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// `SQLite`-based storage implementation.
///
/// # Examples
///
/// ```no_run
/// use pdm_rs::storage::{SqliteStorage, Storage};
///
/// let mut storage = SqliteStorage::open("pdm-rs-state.db").unwrap();
/// storage.init().unwrap();
/// ```
pub struct SqliteStorage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Opens or creates a `SQLite` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
            }
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", []).map_err(StorageError::from)?;
        let _: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0)).map_err(StorageError::from)?;

        Ok(Self { conn, path: Some(path) })
    }

    /// Creates an in-memory `SQLite` database. Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", []).map_err(StorageError::from)?;
        Ok(Self { conn, path: None })
    }

    /// Returns the database path (`None` for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get_schema_version(&self) -> Result<Option<u32>> {
        let version: Option<String> = self.conn.query_row(GET_VERSION_SQL, [], |row| row.get(0)).optional().map_err(StorageError::from)?;
        Ok(version.and_then(|v| v.parse().ok()))
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn.execute(SET_VERSION_SQL, params![version.to_string()]).map_err(StorageError::from)?;
        Ok(())
    }

    #[allow(clippy::cast_possible_wrap)]
    fn now() -> i64 {
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
    }

    fn ensure_run(&mut self, run_id: &str) -> Result<()> {
        let now = Self::now();
        self.conn
            .execute(
                "INSERT INTO runs (run_id, created_at, updated_at) VALUES (?, ?, ?) ON CONFLICT(run_id) DO UPDATE SET updated_at = excluded.updated_at",
                params![run_id, now, now],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn load_blob(&self, table: &str, run_id: &str) -> Result<Option<String>> {
        let sql = format!("SELECT data FROM {table} WHERE run_id = ?");
        self.conn.query_row(&sql, params![run_id], |row| row.get(0)).optional().map_err(|e| StorageError::from(e).into())
    }
}

impl Storage for SqliteStorage {
    fn init(&mut self) -> Result<()> {
        let is_init: i64 = self.conn.query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0)).map_err(StorageError::from)?;

        if is_init == 0 {
            self.conn.execute_batch(SCHEMA_SQL).map_err(StorageError::from)?;
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        } else if let Some(current) = self.get_schema_version()? {
            if current < CURRENT_SCHEMA_VERSION {
                for migration in crate::storage::schema::get_migrations_from(current) {
                    self.conn.execute_batch(migration.sql).map_err(|e| StorageError::Migration(e.to_string()))?;
                }
                self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
            }
        }

        Ok(())
    }

    fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0)).map_err(StorageError::from)?;
        Ok(count > 0)
    }

    fn reset(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
            DELETE FROM manifests;
            DELETE FROM reports;
            DELETE FROM scored_results;
            DELETE FROM chunk_graphs;
            DELETE FROM documents;
            DELETE FROM runs;
        ",
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn open_run(&mut self, run_id: &str) -> Result<()> {
        self.ensure_run(run_id)
    }

    fn list_runs(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT run_id FROM runs ORDER BY created_at DESC").map_err(StorageError::from)?;
        let runs = stmt
            .query_map([], |row| row.get(0))
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StorageError::from)?;
        Ok(runs)
    }

    fn delete_run(&mut self, run_id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM runs WHERE run_id = ?", params![run_id]).map_err(StorageError::from)?;
        Ok(())
    }

    fn save_document(&mut self, run_id: &str, document: &PlanDocument) -> Result<()> {
        self.ensure_run(run_id)?;
        let data = serde_json::to_string(document).map_err(StorageError::from)?;
        let now = Self::now();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO documents (run_id, document_id, content_hash, data, created_at) VALUES (?, ?, ?, ?, ?)",
                params![run_id, document.id, document.metadata.content_hash, data, now],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn load_document(&self, run_id: &str) -> Result<Option<PlanDocument>> {
        self.load_blob("documents", run_id)?.map(|json| serde_json::from_str(&json).map_err(|e| StorageError::from(e).into())).transpose()
    }

    fn save_chunk_graph(&mut self, run_id: &str, graph: &ChunkGraph) -> Result<()> {
        self.ensure_run(run_id)?;
        let data = serde_json::to_string(graph).map_err(StorageError::from)?;
        let now = Self::now();
        self.conn
            .execute("INSERT OR REPLACE INTO chunk_graphs (run_id, data, created_at) VALUES (?, ?, ?)", params![run_id, data, now])
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn load_chunk_graph(&self, run_id: &str) -> Result<Option<ChunkGraph>> {
        self.load_blob("chunk_graphs", run_id)?.map(|json| serde_json::from_str(&json).map_err(|e| StorageError::from(e).into())).transpose()
    }

    fn load_chunk(&self, run_id: &str, policy_area_id: u8, dimension_id: u8) -> Result<Option<Chunk>> {
        Ok(self.load_chunk_graph(run_id)?.and_then(|graph| graph.cell(policy_area_id, dimension_id).cloned()))
    }

    fn save_scored_results(&mut self, run_id: &str, results: &[ScoredResult]) -> Result<()> {
        self.ensure_run(run_id)?;
        let data = serde_json::to_string(results).map_err(StorageError::from)?;
        let now = Self::now();
        self.conn
            .execute("INSERT OR REPLACE INTO scored_results (run_id, data, created_at) VALUES (?, ?, ?)", params![run_id, data, now])
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn load_scored_results(&self, run_id: &str) -> Result<Vec<ScoredResult>> {
        Ok(self.load_blob("scored_results", run_id)?.map(|json| serde_json::from_str(&json)).transpose().map_err(StorageError::from)?.unwrap_or_default())
    }

    fn save_report(&mut self, run_id: &str, report: &AnalysisReport) -> Result<()> {
        self.ensure_run(run_id)?;
        let data = serde_json::to_string(report).map_err(StorageError::from)?;
        let now = Self::now();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO reports (run_id, macro_score, data, created_at) VALUES (?, ?, ?, ?)",
                params![run_id, report.macro_score.score, data, now],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn load_report(&self, run_id: &str) -> Result<Option<AnalysisReport>> {
        self.load_blob("reports", run_id)?.map(|json| serde_json::from_str(&json).map_err(|e| StorageError::from(e).into())).transpose()
    }

    fn save_manifest(&mut self, run_id: &str, manifest: &VerificationManifest) -> Result<()> {
        self.ensure_run(run_id)?;
        let data = serde_json::to_string(manifest).map_err(StorageError::from)?;
        let now = Self::now();
        self.conn
            .execute(
                "INSERT OR REPLACE INTO manifests (run_id, sealed, data, created_at) VALUES (?, ?, ?, ?)",
                params![run_id, i64::from(manifest.integrity_hmac.is_some()), data, now],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn load_manifest(&self, run_id: &str) -> Result<Option<VerificationManifest>> {
        self.load_blob("manifests", run_id)?.map(|json| serde_json::from_str(&json).map_err(|e| StorageError::from(e).into())).transpose()
    }

    fn stats(&self) -> Result<StorageStats> {
        let run_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0)).map_err(StorageError::from)?;
        let sealed_run_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM manifests WHERE sealed = 1", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        let schema_version = self.get_schema_version()?.unwrap_or(0);
        let db_size = self.path.as_ref().and_then(|p| std::fs::metadata(p).ok().map(|m| m.len()));

        Ok(StorageStats {
            run_count: run_count as usize,
            sealed_run_count: sealed_run_count as usize,
            schema_version,
            db_size,
        })
    }
}

// SAFETY: SqliteStorage is only accessed from a single thread at a time;
// the CLI drives one run to completion before starting another.
#[allow(unsafe_code)]
unsafe impl Send for SqliteStorage {}
#[allow(unsafe_code)]
unsafe impl Sync for SqliteStorage {}
