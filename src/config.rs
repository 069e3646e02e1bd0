//! Execution configuration: timeouts, retry budgets, seed, concurrency cap.
//!
//! Loaded from a JSON file with `deny_unknown_fields` and no field defaults —
//! every run states its own timeouts and seed explicitly rather than
//! inheriting silent defaults, per the "no defaults accepted" rule.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-phase timeout budget, in milliseconds, for each orchestrator phase
/// that can block on chunking, execution, or I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseTimeouts {
    /// Timeout for the chunking phase.
    pub chunking_ms: u64,
    /// Timeout for the executor framework phase.
    pub execution_ms: u64,
    /// Timeout for the Bayesian evidence phase.
    pub bayesian_ms: u64,
    /// Timeout for the scoring phase.
    pub scoring_ms: u64,
    /// Timeout for the aggregation phase.
    pub aggregation_ms: u64,
}

impl PhaseTimeouts {
    /// Returns the chunking timeout as a [`Duration`].
    #[must_use]
    pub const fn chunking(&self) -> Duration {
        Duration::from_millis(self.chunking_ms)
    }

    /// Returns the execution timeout as a [`Duration`].
    #[must_use]
    pub const fn execution(&self) -> Duration {
        Duration::from_millis(self.execution_ms)
    }

    /// Returns the Bayesian-update timeout as a [`Duration`].
    #[must_use]
    pub const fn bayesian(&self) -> Duration {
        Duration::from_millis(self.bayesian_ms)
    }

    /// Returns the scoring timeout as a [`Duration`].
    #[must_use]
    pub const fn scoring(&self) -> Duration {
        Duration::from_millis(self.scoring_ms)
    }

    /// Returns the aggregation timeout as a [`Duration`].
    #[must_use]
    pub const fn aggregation(&self) -> Duration {
        Duration::from_millis(self.aggregation_ms)
    }
}

/// Retry budget applied to transient failures (storage contention, I/O).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryBudget {
    /// Maximum retry attempts per operation.
    pub max_attempts: u32,
    /// Base backoff between attempts, in milliseconds.
    pub backoff_ms: u64,
}

/// Top-level execution configuration for one pipeline run.
///
/// Deliberately carries no `Default` impl: every field must be stated
/// explicitly in the config file, per spec.md's "no defaults accepted" rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Base seed all per-component seeds derive from.
    pub seed: u64,
    /// Per-phase timeout budget.
    pub phase_timeouts: PhaseTimeouts,
    /// Retry budget for transient failures.
    pub retry_budget: RetryBudget,
    /// Bounded-parallelism concurrency cap; `None` means "logical CPUs".
    pub concurrency_cap: Option<usize>,
    /// Whether a `provenance_completeness` below `1.0` is tolerated.
    ///
    /// The Open Question resolution in `DESIGN.md`: this is `false` unless a
    /// run explicitly opts in, since the default gate is `1.0` with no
    /// silent clamping.
    pub allow_partial_provenance: bool,
    /// Whether network access for model/embedding downloads is forbidden.
    pub offline_mode: bool,
    /// Whether Hugging Face Hub access is permitted when not offline.
    pub hf_online: bool,
}

impl ExecutionConfig {
    /// Loads and parses an execution config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse as a
    /// well-formed [`ExecutionConfig`] (unknown fields are rejected).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = crate::io::read_file(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Resolves the effective concurrency cap, falling back to the number
    /// of logical CPUs when unset.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency_cap.unwrap_or_else(|| std::thread::available_parallelism().map_or(1, std::num::NonZero::get))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json() -> &'static str {
        r#"{
            "seed": 42,
            "phase_timeouts": {
                "chunking_ms": 1000,
                "execution_ms": 2000,
                "bayesian_ms": 500,
                "scoring_ms": 500,
                "aggregation_ms": 500
            },
            "retry_budget": { "max_attempts": 3, "backoff_ms": 100 },
            "concurrency_cap": 4,
            "allow_partial_provenance": false,
            "offline_mode": true,
            "hf_online": false
        }"#
    }

    #[test]
    fn test_load_parses_well_formed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::File::create(&path).unwrap().write_all(sample_json().as_bytes()).unwrap();
        let config = ExecutionConfig::load(&path).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.effective_concurrency(), 4);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let bad = sample_json().replace("\"seed\": 42,", "\"seed\": 42, \"bogus_field\": true,");
        std::fs::File::create(&path).unwrap().write_all(bad.as_bytes()).unwrap();
        assert!(ExecutionConfig::load(&path).is_err());
    }

    #[test]
    fn test_effective_concurrency_falls_back_to_cpus() {
        let mut config: ExecutionConfig = serde_json::from_str(sample_json()).unwrap();
        config.concurrency_cap = None;
        assert!(config.effective_concurrency() >= 1);
    }

    #[test]
    fn test_phase_timeouts_convert_to_duration() {
        let config: ExecutionConfig = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(config.phase_timeouts.chunking(), Duration::from_millis(1000));
    }
}
