//! The verification manifest: an HMAC-signed record of one pipeline run.
//!
//! A manifest is created at phase 0 and sealed at the end of the run. Once
//! sealed it is immutable; `verify` recomputes the HMAC over the canonical
//! JSON of everything but the signature itself and compares.

pub mod hashing;
pub mod seed;

pub use seed::SeedRegistry;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;

use crate::error::{ManifestError, Result};
use hashing::canonical_hash;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of a single orchestration phase, recorded for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Phase name (e.g. `"chunking"`, `"calibration"`, `"execution"`).
    pub phase: String,
    /// Whether the phase completed successfully.
    pub success: bool,
    /// Human-readable detail, present on failure.
    pub detail: Option<String>,
}

/// Fingerprint of the environment a run executed in, for reproducibility
/// auditing (not for behavior branching — the pipeline never reads this to
/// change what it does).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentFingerprint {
    /// Crate version that produced the run.
    pub pdm_rs_version: String,
    /// Whether `OFFLINE_MODE` was set.
    pub offline_mode: bool,
    /// Whether `HF_ONLINE` was set.
    pub hf_online: bool,
}

/// An HMAC-signed record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationManifest {
    /// Run identifier.
    pub run_id: String,
    /// UTC timestamp the run started.
    pub started_at: DateTime<Utc>,
    /// UTC timestamp the run completed, set by `seal`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Base seed for this run's `SeedRegistry`.
    pub seed: u64,
    /// SHA-256 hash of the normalized input document.
    pub document_hash: String,
    /// SHA-256 hash of the canonical method catalog.
    pub catalog_hash: String,
    /// SHA-256 hash of the calibration registry.
    pub registry_hash: String,
    /// SHA-256 hash of the sealed chunk graph ("monolith hash").
    pub monolith_hash: Option<String>,
    /// Per-phase outcomes, in execution order.
    pub phases: Vec<PhaseOutcome>,
    /// Environment fingerprint.
    pub environment: EnvironmentFingerprint,
    /// HMAC-SHA256 signature over the canonical JSON of every other field,
    /// hex-encoded. `None` until `seal` is called.
    pub integrity_hmac: Option<String>,
}

/// Fields signed by the manifest's HMAC, excluding the signature itself.
#[derive(Serialize)]
struct SignableManifest<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    seed: u64,
    document_hash: &'a str,
    catalog_hash: &'a str,
    registry_hash: &'a str,
    monolith_hash: Option<&'a str>,
    phases: &'a [PhaseOutcome],
    environment: &'a EnvironmentFingerprint,
}

impl VerificationManifest {
    /// Opens a manifest for an in-progress run.
    #[must_use]
    pub fn open(
        run_id: impl Into<String>,
        started_at: DateTime<Utc>,
        seed: u64,
        document_hash: String,
        catalog_hash: String,
        registry_hash: String,
        environment: EnvironmentFingerprint,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
            completed_at: None,
            seed,
            document_hash,
            catalog_hash,
            registry_hash,
            monolith_hash: None,
            phases: Vec::new(),
            environment,
            integrity_hmac: None,
        }
    }

    /// Records one phase's outcome.
    pub fn record_phase(&mut self, phase: impl Into<String>, success: bool, detail: Option<String>) {
        self.phases.push(PhaseOutcome {
            phase: phase.into(),
            success,
            detail,
        });
    }

    fn signable(&self) -> SignableManifest<'_> {
        SignableManifest {
            run_id: &self.run_id,
            started_at: self.started_at,
            completed_at: self.completed_at,
            seed: self.seed,
            document_hash: &self.document_hash,
            catalog_hash: &self.catalog_hash,
            registry_hash: &self.registry_hash,
            monolith_hash: self.monolith_hash.as_deref(),
            phases: &self.phases,
            environment: &self.environment,
        }
    }

    /// Seals the manifest: sets `completed_at`/`monolith_hash` and computes
    /// `integrity_hmac` over the canonical JSON of the signed fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest was already sealed, or if signing
    /// fails.
    pub fn seal(&mut self, completed_at: DateTime<Utc>, monolith_hash: String, key: &[u8]) -> Result<()> {
        if self.integrity_hmac.is_some() {
            return Err(ManifestError::AlreadySealed.into());
        }
        self.completed_at = Some(completed_at);
        self.monolith_hash = Some(monolith_hash);
        let canonical = hashing::canonical_json(&self.signable())?;
        let mut mac = HmacSha256::new_from_slice(key).map_err(|_| ManifestError::SignatureInvalid)?;
        mac.update(canonical.as_bytes());
        let signature = mac.finalize().into_bytes();
        self.integrity_hmac = Some(hex_encode(&signature));
        Ok(())
    }

    /// Verifies the manifest's HMAC against `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is unsealed or the signature does
    /// not match.
    pub fn verify(&self, key: &[u8]) -> Result<()> {
        let expected = self.integrity_hmac.as_ref().ok_or(ManifestError::NotSealed)?;
        let canonical = hashing::canonical_json(&self.signable())?;
        let mut mac = HmacSha256::new_from_slice(key).map_err(|_| ManifestError::SignatureInvalid)?;
        mac.update(canonical.as_bytes());
        let actual = hex_encode(&mac.finalize().into_bytes());
        if &actual == expected {
            Ok(())
        } else {
            Err(ManifestError::HashMismatch {
                artifact: "manifest".to_string(),
                expected: expected.clone(),
                actual,
            }
            .into())
        }
    }

    /// Returns `true` if every recorded phase succeeded.
    #[must_use]
    pub fn all_phases_succeeded(&self) -> bool {
        self.phases.iter().all(|p| p.success)
    }

    /// Returns a map of phase name to success flag, for quick lookups.
    #[must_use]
    pub fn phase_map(&self) -> BTreeMap<&str, bool> {
        self.phases.iter().map(|p| (p.phase.as_str(), p.success)).collect()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Computes the `canonical_hash` of a serializable value, re-exported here
/// for callers that only need the manifest module's public surface.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn hash_artifact<T: Serialize>(value: &T) -> Result<String> {
    canonical_hash(value)
}
