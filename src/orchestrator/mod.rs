//! The phase orchestrator: runs one plan document through the whole
//! pipeline and hands back an `AnalysisReport` plus a sealed
//! `VerificationManifest` and `Proof`.
//!
//! Per the concurrency model, orchestration itself is single-threaded and
//! cooperative — phases run in sequence, and only a phase's own internal
//! work (chunking's per-cell embedding and annotation extraction) fans out
//! onto the bounded `rayon` global pool, sized once from
//! `ExecutionConfig::effective_concurrency`. Timeouts are checked at phase
//! boundaries rather than preempted mid-phase: nothing here runs on a
//! thread that could be cancelled from outside, so a "timeout" means the
//! phase ran to completion but exceeded its budget, not that it was cut
//! short.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aggregation;
use crate::bayesian::BayesianEngine;
use crate::calibration::CalibrationRegistry;
use crate::catalog::MethodCatalog;
use crate::chunking::StrategicChunker;
use crate::config::ExecutionConfig;
use crate::core::{AreaScore, ClusterScore, DimensionScore, MacroScore, PlanDocument, ScoredResult};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Error, ExecutorError, Result};
use crate::executor::MethodExecutor;
use crate::executors::{CircuitBreaker, ExecutorFramework, QuestionnaireBundle};
use crate::manifest::{hash_artifact, EnvironmentFingerprint, VerificationManifest};
use crate::scoring::Scorer;

/// Runs a phase's work and checks its wall-clock budget once the work
/// completes, recording the outcome on `manifest` either way.
fn run_phase<T>(manifest: &mut VerificationManifest, phase: &str, budget: Duration, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    match f() {
        Ok(value) => {
            if start.elapsed() > budget {
                let err: Error = ExecutorError::PhaseTimeout {
                    phase: phase.to_string(),
                    budget_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
                }
                .into();
                manifest.record_phase(phase, false, Some(err.to_string()));
                return Err(err);
            }
            manifest.record_phase(phase, true, None);
            Ok(value)
        }
        Err(err) => {
            manifest.record_phase(phase, false, Some(err.to_string()));
            Err(err)
        }
    }
}

/// The final, report-shaped output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Identifier of the plan document this report covers.
    pub document_id: String,
    /// All sixty dimension-area cell scores.
    pub dimensions: Vec<DimensionScore>,
    /// All ten policy area scores.
    pub areas: Vec<AreaScore>,
    /// All four cluster scores.
    pub clusters: Vec<ClusterScore>,
    /// The single overall score.
    pub macro_score: MacroScore,
    /// Total micro-question results scored for this run.
    pub total_questions: usize,
}

/// A minimal cryptographic proof of a completed run: the hash of its sealed
/// manifest, independently recomputable from the manifest JSON alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    /// SHA-256 hash (hex) of the sealed, canonicalized manifest.
    pub manifest_hash: String,
}

/// Drives one document through every phase of the pipeline.
///
/// Borrows the catalog, registry, and method executor for the duration of
/// the run, matching their "loaded once, never mutated" ownership model.
pub struct Orchestrator<'a> {
    config: &'a ExecutionConfig,
    catalog: &'a MethodCatalog,
    registry: &'a CalibrationRegistry,
    methods: &'a MethodExecutor,
    embedder: Arc<dyn Embedder>,
}

impl<'a> Orchestrator<'a> {
    /// Builds an orchestrator, sizing the global `rayon` pool from
    /// `config.effective_concurrency()`. Only the first orchestrator built
    /// in a process actually sets the pool size; later calls silently
    /// reuse whatever was configured first, since the global pool can only
    /// be initialized once.
    ///
    /// # Errors
    ///
    /// Returns an error if the default embedder cannot be constructed.
    pub fn new(config: &'a ExecutionConfig, catalog: &'a MethodCatalog, registry: &'a CalibrationRegistry, methods: &'a MethodExecutor) -> Result<Self> {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(config.effective_concurrency()).build_global();
        Ok(Self {
            config,
            catalog,
            registry,
            methods,
            embedder: Arc::from(create_embedder()?),
        })
    }

    /// Runs the full pipeline for one document, sealing a manifest signed
    /// with `hmac_key`.
    ///
    /// # Errors
    ///
    /// Returns an error from the first phase that fails: catalog/
    /// calibration cross-validation, chunking, method execution, scoring,
    /// aggregation, or manifest sealing.
    pub fn run(&self, run_id: impl Into<String>, document: &PlanDocument, bundle: &QuestionnaireBundle, hmac_key: &[u8]) -> Result<(AnalysisReport, VerificationManifest, Proof)> {
        let started_at = Utc::now();
        self.catalog.validate_against(self.registry.calibrations())?;

        let catalog_hash = hash_artifact(self.catalog)?;
        let registry_hash = hash_artifact(self.registry)?;
        let mut manifest = VerificationManifest::open(
            run_id,
            started_at,
            self.config.seed,
            document.metadata.content_hash.clone(),
            catalog_hash,
            registry_hash,
            EnvironmentFingerprint {
                pdm_rs_version: env!("CARGO_PKG_VERSION").to_string(),
                offline_mode: self.config.offline_mode,
                hf_online: self.config.hf_online,
            },
        );
        manifest.record_phase("catalog_calibration", true, None);

        let chunker = StrategicChunker::new(Arc::clone(&self.embedder));
        let chunk_graph = run_phase(&mut manifest, "chunking", self.config.phase_timeouts.chunking(), || chunker.chunk(document))?;

        let framework = ExecutorFramework::new(self.catalog, self.registry, self.methods);
        let max_attempts = self.config.retry_budget.max_attempts.max(1);
        let mut evidence_by_question = run_phase(&mut manifest, "execution", self.config.phase_timeouts.execution(), || {
            let mut breaker = CircuitBreaker::new(max_attempts);
            framework.run(&chunk_graph, bundle, &mut breaker)
        })?;

        run_phase(&mut manifest, "bayesian", self.config.phase_timeouts.bayesian(), || {
            apply_bayesian_updates(&mut evidence_by_question);
            Ok(())
        })?;

        let results = run_phase(&mut manifest, "scoring", self.config.phase_timeouts.scoring(), || score_all(bundle, &mut evidence_by_question))?;

        let (dimensions, areas, clusters, macro_score) = run_phase(&mut manifest, "aggregation", self.config.phase_timeouts.aggregation(), || {
            let dimensions = aggregation::aggregate_dimensions(&results)?;
            let areas = aggregation::aggregate_areas(&dimensions)?;
            let clusters = aggregation::aggregate_clusters(&areas)?;
            let macro_score = aggregation::aggregate_macro(&clusters)?;
            if !aggregation::cascade_is_complete(&dimensions, &areas, &clusters) {
                return Err(Error::InvalidState {
                    message: "aggregation cascade did not cover every cell, area, and cluster".to_string(),
                });
            }
            Ok((dimensions, areas, clusters, macro_score))
        })?;

        let report = AnalysisReport {
            document_id: document.id.clone(),
            dimensions,
            areas,
            clusters,
            macro_score,
            total_questions: results.len(),
        };
        manifest.record_phase("report_rendering", true, None);

        let monolith_hash = hash_artifact(&chunk_graph)?;
        manifest.seal(Utc::now(), monolith_hash, hmac_key)?;
        manifest.record_phase("manifest_sealing", true, None);

        let proof = Proof {
            manifest_hash: hash_artifact(&manifest)?,
        };

        Ok((report, manifest, proof))
    }
}

/// Updates each question's posterior from whatever probative-test
/// observations its method outputs carry. Questions with no probative
/// tests attached keep `posterior = None`, and the scorer falls back to
/// mean confidence for them.
fn apply_bayesian_updates(evidence_by_question: &mut std::collections::BTreeMap<String, crate::core::Evidence>) {
    let engine = BayesianEngine::new();
    for evidence in evidence_by_question.values_mut() {
        let observations: Vec<_> = evidence
            .method_outputs
            .values()
            .filter_map(|output| output.probative_test.map(|test| (test, output.confidence >= 0.5)))
            .collect();
        if observations.is_empty() {
            continue;
        }
        if let Ok(posterior) = engine.update_sequence(0.5, &observations) {
            evidence.posterior = Some(posterior);
        }
    }
}

fn score_all(bundle: &QuestionnaireBundle, evidence_by_question: &mut std::collections::BTreeMap<String, crate::core::Evidence>) -> Result<Vec<ScoredResult>> {
    let scorer = Scorer::new();
    let mut results = Vec::with_capacity(evidence_by_question.len());
    for definition in bundle.iter() {
        for policy_area_id in 1..=u8::try_from(crate::core::POLICY_AREA_COUNT).unwrap_or(u8::MAX) {
            let global_id = definition.slot.global_id(policy_area_id);
            let evidence = evidence_by_question.remove(&global_id).unwrap_or_default();
            let result = scorer.score(global_id, definition.slot.name(), policy_area_id, definition.slot.dimension_id, definition.modality, evidence)?;
            results.push(result);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::{QuestionDefinition, QuestionSlot, QUESTIONS_PER_DIMENSION};
    use crate::scoring::ScoringModality;
    use crate::core::DIMENSION_COUNT;

    fn full_bundle() -> QuestionnaireBundle {
        let mut defs = Vec::new();
        for dimension_id in 1..=u8::try_from(DIMENSION_COUNT).unwrap() {
            for question_id in 1..=u8::try_from(QUESTIONS_PER_DIMENSION).unwrap() {
                let modality = if question_id % 2 == 0 { ScoringModality::TypeB } else { ScoringModality::TypeA };
                defs.push(QuestionDefinition {
                    slot: QuestionSlot { dimension_id, question_id },
                    modality,
                    method_sequence: Vec::new(),
                });
            }
        }
        QuestionnaireBundle::load(defs).unwrap()
    }

    fn sample_document() -> PlanDocument {
        let mut content = String::new();
        for i in 0..500 {
            content.push_str(&format!("Texto del plan municipal, seccion {i}, con objetivos y metas claras. "));
        }
        PlanDocument::new("muni-orchestrator-test", content.clone(), vec![content.len()])
    }

    fn sample_config() -> ExecutionConfig {
        serde_json::from_str(
            r#"{
                "seed": 7,
                "phase_timeouts": {
                    "chunking_ms": 30000,
                    "execution_ms": 30000,
                    "bayesian_ms": 30000,
                    "scoring_ms": 30000,
                    "aggregation_ms": 30000
                },
                "retry_budget": { "max_attempts": 3, "backoff_ms": 10 },
                "concurrency_cap": 2,
                "allow_partial_provenance": false,
                "offline_mode": true,
                "hf_online": false
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_run_produces_complete_cascade_with_no_methods() {
        let config = sample_config();
        let catalog = MethodCatalog::load(Vec::new()).unwrap();
        let registry = CalibrationRegistry::load(Vec::new()).unwrap();
        let methods = MethodExecutor::new();
        let orchestrator = Orchestrator::new(&config, &catalog, &registry, &methods).unwrap();
        let document = sample_document();
        let bundle = full_bundle();

        let (report, manifest, proof) = orchestrator.run("run-1", &document, &bundle, b"test-key").unwrap();

        assert_eq!(report.dimensions.len(), crate::core::POLICY_AREA_COUNT * crate::core::DIMENSION_COUNT);
        assert_eq!(report.areas.len(), crate::core::POLICY_AREA_COUNT);
        assert_eq!(report.clusters.len(), aggregation::CLUSTERS.len());
        assert!(manifest.all_phases_succeeded());
        assert!(manifest.verify(b"test-key").is_ok());
        assert!(!proof.manifest_hash.is_empty());
    }

    #[test]
    fn test_run_rejects_uncalibrated_required_method() {
        use crate::catalog::{CanonicalMethod, LayerPositionality};

        let config = sample_config();
        let catalog = MethodCatalog::load(vec![CanonicalMethod {
            id: "m1".to_string(),
            name: "m1".to_string(),
            positionality: LayerPositionality::Executor,
            requires_calibration: true,
            parameters: None,
            kind: crate::catalog::MethodKind::Constant,
            config: None,
        }])
        .unwrap();
        let registry = CalibrationRegistry::load(Vec::new()).unwrap();
        let methods = MethodExecutor::new();
        let orchestrator = Orchestrator::new(&config, &catalog, &registry, &methods).unwrap();
        let document = sample_document();
        let bundle = full_bundle();

        assert!(orchestrator.run("run-2", &document, &bundle, b"test-key").is_err());
    }
}
