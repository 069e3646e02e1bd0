//! Command execution: the dispatcher between parsed CLI arguments and the
//! library's pipeline, storage, and manifest layers.

use std::path::Path;

use crate::calibration::{CalibrationRegistry, MethodCalibration};
use crate::catalog::{CanonicalMethod, MethodCatalog};
use crate::cli::output::{format_error, format_run_result, format_status, format_verify_result, OutputFormat};
use crate::cli::parser::{Cli, Commands};
use crate::config::ExecutionConfig;
use crate::core::PlanDocument;
use crate::error::{CommandError, Result};
use crate::executor;
use crate::executors::{QuestionDefinition, QuestionnaireBundle};
use crate::manifest::VerificationManifest;
use crate::orchestrator::Orchestrator;
use crate::storage::{SqliteStorage, Storage};

/// Executes a parsed CLI invocation, returning the text to print to stdout.
///
/// # Errors
///
/// Returns an error if the requested operation fails at any stage:
/// storage access, artifact parsing, or pipeline execution.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();

    match &cli.command {
        Commands::Init { force } => execute_init(&db_path, *force),
        Commands::Status => execute_status(&db_path, format),
        Commands::Reset { yes } => execute_reset(&db_path, *yes),
        Commands::Run { run_id, plan, questionnaire, catalog, calibration, config, artifacts_dir, hmac_key } => {
            execute_run(&db_path, run_id, plan, questionnaire, catalog, calibration, config, artifacts_dir, hmac_key, format)
        }
        Commands::Verify { manifest, hmac_key } => execute_verify(manifest, hmac_key, format),
    }
}

fn open_storage(db_path: &Path) -> Result<SqliteStorage> {
    let mut storage = SqliteStorage::open(db_path)?;
    storage.init()?;
    Ok(storage)
}

fn execute_init(db_path: &Path, force: bool) -> Result<String> {
    let mut storage = SqliteStorage::open(db_path)?;
    storage.init()?;
    if force {
        storage.reset()?;
    }
    Ok(format!("Initialized pipeline storage at {}\n", db_path.display()))
}

fn execute_status(db_path: &Path, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let stats = storage.stats()?;
    Ok(format_status(&stats, format))
}

fn execute_reset(db_path: &Path, yes: bool) -> Result<String> {
    if !yes {
        return Err(CommandError::MissingArgument("pass --yes to confirm reset".to_string()).into());
    }
    let mut storage = open_storage(db_path)?;
    storage.reset()?;
    Ok("Storage reset.\n".to_string())
}

fn hex_decode(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(CommandError::InvalidArgument("hmac key hex string must have an even length".to_string()).into());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| CommandError::InvalidArgument(format!("invalid hex byte in hmac key: {}", &hex[i..i + 2])).into())
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn execute_run(
    db_path: &Path,
    run_id: &str,
    plan_path: &Path,
    questionnaire_path: &Path,
    catalog_path: &Path,
    calibration_path: &Path,
    config_path: &Path,
    artifacts_dir: &Path,
    hmac_key_hex: &str,
    format: OutputFormat,
) -> Result<String> {
    let document = PlanDocument::from_file(run_id.to_string(), plan_path.to_path_buf())?;

    let definitions: Vec<QuestionDefinition> = serde_json::from_str(&crate::io::read_file(questionnaire_path)?)?;
    let bundle = QuestionnaireBundle::load(definitions)?;

    let methods: Vec<CanonicalMethod> = serde_json::from_str(&crate::io::read_file(catalog_path)?)?;
    let catalog = MethodCatalog::load(methods)?;

    let calibrations: Vec<MethodCalibration> = serde_json::from_str(&crate::io::read_file(calibration_path)?)?;
    let registry = CalibrationRegistry::load(calibrations)?;

    let config = ExecutionConfig::load(config_path)?;
    let hmac_key = hex_decode(hmac_key_hex)?;

    let method_executor = executor::build_from_catalog(&catalog)?;
    let orchestrator = Orchestrator::new(&config, &catalog, &registry, &method_executor)?;
    let (report, manifest, proof) = orchestrator.run(run_id, &document, &bundle, &hmac_key)?;

    let verified = manifest.verify(&hmac_key).is_ok();

    std::fs::create_dir_all(artifacts_dir)?;
    write_json(&artifacts_dir.join("report.json"), &report)?;
    write_json(&artifacts_dir.join("manifest.json"), &manifest)?;
    write_json(&artifacts_dir.join("proof.json"), &proof)?;
    std::fs::write(artifacts_dir.join("proof.hash"), &proof.manifest_hash)?;

    let mut storage = open_storage(db_path)?;
    storage.open_run(run_id)?;
    storage.save_document(run_id, &document)?;
    storage.save_report(run_id, &report)?;
    storage.save_manifest(run_id, &manifest)?;

    let output = format_run_result(&report, &proof, verified, format);
    if !verified {
        return Err(crate::error::Error::InvalidState { message: format!("run {run_id} completed but failed manifest verification") });
    }
    Ok(output)
}

fn execute_verify(manifest_path: &Path, hmac_key_hex: &str, format: OutputFormat) -> Result<String> {
    let raw = crate::io::read_file(manifest_path)?;
    let manifest: VerificationManifest = serde_json::from_str(&raw)?;
    let hmac_key = hex_decode(hmac_key_hex)?;
    let verified = manifest.verify(&hmac_key).is_ok();
    let output = format_verify_result(&manifest.run_id, verified, format);
    if !verified {
        return Err(crate::error::Error::InvalidState { message: format!("manifest for run {} failed verification", manifest.run_id) });
    }
    Ok(output)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| crate::error::IoError::WriteFailed { path: path.display().to_string(), reason: e.to_string() })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_decode_roundtrip() {
        let bytes = hex_decode("deadbeef").unwrap();
        assert_eq!(bytes, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_hex_decode_rejects_odd_length() {
        assert!(hex_decode("abc").is_err());
    }

    #[test]
    fn test_hex_decode_rejects_invalid_digit() {
        assert!(hex_decode("zz").is_err());
    }

    #[test]
    fn test_execute_reset_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db");
        assert!(execute_reset(&db_path, false).is_err());
    }

    #[test]
    fn test_execute_init_then_status() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db");
        execute_init(&db_path, false).unwrap();
        let status = execute_status(&db_path, OutputFormat::Text).unwrap();
        assert!(status.contains("Runs:"));
    }

    #[test]
    fn test_format_error_is_usable_after_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db");
        let err = execute_reset(&db_path, false).unwrap_err();
        let rendered = format_error(&err, OutputFormat::Json);
        assert!(rendered.contains("\"success\": false"));
    }
}
