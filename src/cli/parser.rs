//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PDM-RS: assessment pipeline for Colombian municipal development plans.
///
/// Ingests a normalized plan document, runs it through strategic chunking,
/// method execution, Bayesian evidence scoring, and the multi-level
/// aggregation cascade, and emits a verifiable analysis report.
#[derive(Parser, Debug)]
#[command(name = "pdm-rs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the pipeline's `SQLite` state database.
    ///
    /// Defaults to `.pdm-rs/pdm-rs.db` in the current directory.
    #[arg(short, long, env = "PDM_RS_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initializes the pipeline's state database.
    Init {
        /// Force re-initialization (destroys existing data).
        #[arg(short, long)]
        force: bool,
    },

    /// Shows storage status: known runs, sealed count, schema version.
    Status,

    /// Deletes all persisted runs, preserving schema.
    Reset {
        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Runs one plan document through the full pipeline.
    Run {
        /// Identifier for this run.
        #[arg(long)]
        run_id: String,

        /// Path to the normalized plan text.
        #[arg(long)]
        plan: PathBuf,

        /// Path to the questionnaire bundle JSON (the ~300 micro-questions).
        #[arg(long)]
        questionnaire: PathBuf,

        /// Path to the canonical method catalog JSON.
        #[arg(long)]
        catalog: PathBuf,

        /// Path to the calibration registry JSON.
        #[arg(long)]
        calibration: PathBuf,

        /// Path to the execution config JSON (seed, timeouts, retry budget).
        #[arg(long)]
        config: PathBuf,

        /// Directory the report, manifest, and proof are written under.
        #[arg(long)]
        artifacts_dir: PathBuf,

        /// HMAC signing key for the verification manifest, as a hex string.
        ///
        /// Falls back to the `PDM_RS_HMAC_KEY` environment variable.
        #[arg(long, env = "PDM_RS_HMAC_KEY")]
        hmac_key: String,
    },

    /// Verifies a previously sealed manifest's HMAC signature and hash chain.
    Verify {
        /// Path to the sealed manifest JSON.
        #[arg(long)]
        manifest: PathBuf,

        /// HMAC key the manifest was sealed with, as a hex string.
        #[arg(long, env = "PDM_RS_HMAC_KEY")]
        hmac_key: String,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}
