//! CLI layer for the assessment pipeline.
//!
//! Provides the command-line interface using clap, with commands for
//! initializing storage, running a full assessment, and verifying a
//! sealed manifest.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
