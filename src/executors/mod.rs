//! The executor framework: runs the thirty `D{d}Q{q}` question templates
//! against each of the ten policy areas, producing the roughly three
//! hundred micro-question evidence pools the scoring stage consumes.
//!
//! Per the REDESIGN FLAGS decision recorded in `DESIGN.md`, this is one flat
//! `ExecutorFramework` driven by a data table (`QuestionnaireBundle`)
//! rather than thirty hand-written executor types — the same shape as the
//! chunking module's single `Chunker` trait plus a string-keyed factory,
//! scaled up.

pub mod state_machine;

pub use state_machine::{CircuitBreaker, ExecutorState};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::calibration::{CalibrationContext, CalibrationEngine, CalibrationRegistry};
use crate::catalog::MethodCatalog;
use crate::core::{Chunk, ChunkGraph, Evidence, MethodOutput, DIMENSION_COUNT, POLICY_AREA_COUNT};
use crate::error::{ExecutorError, Result};
use crate::executor::{ArgRouter, MethodExecutor};
use crate::scoring::ScoringModality;

/// Number of question templates defined per dimension.
pub const QUESTIONS_PER_DIMENSION: usize = 5;
/// Total number of `D{d}Q{q}` executor slots (dimension x question template).
pub const TOTAL_EXECUTOR_SLOTS: usize = DIMENSION_COUNT * QUESTIONS_PER_DIMENSION;
/// Total micro-questions produced once every slot runs against every policy area.
pub const TOTAL_MICRO_QUESTIONS: usize = TOTAL_EXECUTOR_SLOTS * POLICY_AREA_COUNT;

/// One `D{d}Q{q}` question template, independent of policy area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionSlot {
    /// Dimension this template belongs to, `1..=6`.
    pub dimension_id: u8,
    /// Question index within the dimension, `1..=5`.
    pub question_id: u8,
}

impl QuestionSlot {
    /// Formats the slot as `D{d}Q{q}`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("D{}Q{}", self.dimension_id, self.question_id)
    }

    /// Formats the global question id for a specific policy area, `D{d}-Q{q}-PA{n}`.
    #[must_use]
    pub fn global_id(&self, policy_area_id: u8) -> String {
        format!("D{}-Q{}-PA{}", self.dimension_id, self.question_id, policy_area_id)
    }
}

/// A question template's definition: which scoring modality it produces and
/// which methods run, in order, to answer it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    /// The template this definition answers.
    pub slot: QuestionSlot,
    /// Which scoring modality this template's answer is reported in.
    pub modality: ScoringModality,
    /// Ordered method ids invoked for this slot.
    pub method_sequence: Vec<String>,
}

/// The full set of question templates for a run, loaded once and validated
/// to cover exactly the thirty required slots with no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireBundle {
    definitions: BTreeMap<String, QuestionDefinition>,
}

impl QuestionnaireBundle {
    /// Loads a bundle, rejecting duplicate slots and requiring full
    /// thirty-slot coverage.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot is duplicated or coverage is incomplete.
    pub fn load(definitions: Vec<QuestionDefinition>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for def in definitions {
            let key = def.slot.name();
            if map.insert(key.clone(), def).is_some() {
                return Err(ExecutorError::UnknownSlot { slot: key }.into());
            }
        }
        if map.len() != TOTAL_EXECUTOR_SLOTS {
            return Err(ExecutorError::UnknownSlot {
                slot: format!("expected {TOTAL_EXECUTOR_SLOTS} slots, got {}", map.len()),
            }
            .into());
        }
        Ok(Self { definitions: map })
    }

    /// Looks up a slot's definition.
    #[must_use]
    pub fn get(&self, slot: &QuestionSlot) -> Option<&QuestionDefinition> {
        self.definitions.get(&slot.name())
    }

    /// Iterates all thirty definitions in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &QuestionDefinition> {
        self.definitions.values()
    }
}

/// Resolves which chunk feeds a given `(slot, policy_area)` pair. For this
/// pipeline a slot's dimension maps directly onto one chunk cell; the
/// router exists as a seam so a future slot could draw on multiple chunks
/// without changing the executor framework's call sites.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkRouter;

impl ChunkRouter {
    /// Creates the router.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Routes to the single chunk backing `(slot, policy_area_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::NoChunksRouted`] if the cell is missing from
    /// the graph (should not happen for a sealed [`ChunkGraph`]).
    pub fn route<'g>(&self, graph: &'g ChunkGraph, slot: &QuestionSlot, policy_area_id: u8) -> Result<&'g Chunk> {
        graph
            .cell(policy_area_id, slot.dimension_id)
            .ok_or_else(|| ExecutorError::NoChunksRouted { slot: slot.name() }.into())
    }
}

/// Runs the method sequence for every `(slot, policy_area)` pair, producing
/// one [`Evidence`] pool per micro-question.
pub struct ExecutorFramework<'a> {
    catalog: &'a MethodCatalog,
    registry: &'a CalibrationRegistry,
    methods: &'a MethodExecutor,
    chunk_router: ChunkRouter,
    arg_router: ArgRouter,
    calibration_engine: CalibrationEngine,
}

impl<'a> ExecutorFramework<'a> {
    /// Builds a framework over the given catalog, calibration registry, and
    /// method registry, all borrowed for the lifetime of a run.
    #[must_use]
    pub fn new(catalog: &'a MethodCatalog, registry: &'a CalibrationRegistry, methods: &'a MethodExecutor) -> Self {
        Self {
            catalog,
            registry,
            methods,
            chunk_router: ChunkRouter::new(),
            arg_router: ArgRouter::new(),
            calibration_engine: CalibrationEngine::new(),
        }
    }

    /// Runs every definition in `bundle` against every policy area in
    /// `graph`, returning evidence keyed by global question id.
    ///
    /// A method's own `invoke` failure trips the breaker for that method id
    /// but does not abort the slot: subsequent methods in the sequence still
    /// run, and the question's evidence simply lacks that method's
    /// contribution. A tripped breaker causes all of that method's *later*
    /// invocations in this run to be skipped outright. Argument routing
    /// failures, missing calibration for a method that requires it, and
    /// fusion failures are contract violations, not invocation failures:
    /// they abort the run.
    ///
    /// # Errors
    ///
    /// Returns an error if argument routing rejects an unknown or missing
    /// parameter, if a `requires_calibration` method has no registered
    /// calibration, or if Choquet fusion fails.
    pub fn run(&self, graph: &ChunkGraph, bundle: &QuestionnaireBundle, breaker: &mut CircuitBreaker) -> Result<BTreeMap<String, Evidence>> {
        let mut results = BTreeMap::new();
        for definition in bundle.iter() {
            for policy_area_id in 1..=u8::try_from(POLICY_AREA_COUNT).unwrap_or(u8::MAX) {
                let global_id = definition.slot.global_id(policy_area_id);
                let evidence = self.run_one(graph, definition, policy_area_id, breaker)?;
                results.insert(global_id, evidence);
            }
        }
        Ok(results)
    }

    fn run_one(&self, graph: &ChunkGraph, definition: &QuestionDefinition, policy_area_id: u8, breaker: &mut CircuitBreaker) -> Result<Evidence> {
        let mut evidence = Evidence::default();
        let Ok(chunk) = self.chunk_router.route(graph, &definition.slot, policy_area_id) else {
            return Ok(evidence);
        };
        let total_methods = u32::try_from(definition.method_sequence.len()).unwrap_or(u32::MAX);
        for (index, method_id) in definition.method_sequence.iter().enumerate() {
            if breaker.is_open(method_id) {
                continue;
            }
            let Some(catalog_entry) = self.catalog.get(method_id) else {
                continue;
            };
            let available: BTreeMap<String, Value> = BTreeMap::new();
            let args = self.arg_router.route(method_id, catalog_entry.parameters.as_ref(), &available)?;
            let Ok(method) = self.methods.resolve(method_id) else {
                continue;
            };
            match method.invoke(chunk, &args) {
                Ok(raw) => {
                    breaker.record_success(method_id);
                    let confidence = if catalog_entry.requires_calibration {
                        let calibration = self.registry.resolve(method_id)?;
                        let context = CalibrationContext {
                            question_id: definition.slot.global_id(policy_area_id),
                            dimension_id: definition.slot.dimension_id,
                            policy_area_id,
                            unit_of_analysis: "chunk".to_string(),
                            method_position: u32::try_from(index + 1).unwrap_or(u32::MAX),
                            total_methods,
                        };
                        self.calibration_engine.fuse(calibration, &raw.layer_signals, &context)?
                    } else {
                        raw.layer_signals.iter().sum::<f64>() / raw.layer_signals.len() as f64
                    };
                    evidence.add(MethodOutput {
                        method_id: method_id.clone(),
                        confidence,
                        matched_elements: raw.matched_elements,
                        probative_test: None,
                    });
                }
                Err(_) => {
                    let _ = breaker.record_failure(method_id);
                }
            }
        }
        Ok(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{MethodCalibration, LAYER_COUNT};
    use crate::catalog::{CanonicalMethod, LayerPositionality, ParameterSchema};
    use crate::core::{Chunk, ChunkBuilder, ChunkGraph, Provenance, DIMENSION_COUNT, POLICY_AREA_COUNT, TOTAL_CELLS};
    use crate::executor::{Method, MethodArgs, MethodExecutor, RawMethodOutput};
    use std::sync::Arc;

    fn sample_chunk(pa: u8, dim: u8) -> Chunk {
        ChunkBuilder::new(pa, dim)
            .content(format!("text for PA{pa}-DIM{dim}"))
            .provenance(Provenance::complete(1, 1, 0..10))
            .build()
            .unwrap()
    }

    fn full_chunk_graph() -> ChunkGraph {
        let mut chunks = Vec::with_capacity(TOTAL_CELLS);
        for pa in 1..=POLICY_AREA_COUNT as u8 {
            for dim in 1..=DIMENSION_COUNT as u8 {
                chunks.push(sample_chunk(pa, dim));
            }
        }
        ChunkGraph::seal(chunks).unwrap()
    }

    fn single_method_bundle(method_id: &str) -> Vec<QuestionDefinition> {
        let mut defs = Vec::new();
        for dimension_id in 1..=DIMENSION_COUNT as u8 {
            for question_id in 1..=QUESTIONS_PER_DIMENSION as u8 {
                let modality = if question_id % 2 == 0 { ScoringModality::TypeB } else { ScoringModality::TypeA };
                let method_sequence = if dimension_id == 1 && question_id == 1 { vec![method_id.to_string()] } else { Vec::new() };
                defs.push(QuestionDefinition {
                    slot: QuestionSlot { dimension_id, question_id },
                    modality,
                    method_sequence,
                });
            }
        }
        defs
    }

    struct EchoMethod;

    impl Method for EchoMethod {
        fn id(&self) -> &str {
            "echo"
        }

        fn invoke(&self, _chunk: &Chunk, _args: &MethodArgs) -> Result<RawMethodOutput> {
            Ok(RawMethodOutput::empty())
        }
    }

    #[test]
    fn test_run_propagates_arg_routing_contract_violation() {
        let method_id = "D1Q1.needs_arg";
        let catalog = MethodCatalog::load(vec![CanonicalMethod {
            id: method_id.to_string(),
            name: "needs arg".to_string(),
            positionality: LayerPositionality::Utility,
            requires_calibration: false,
            parameters: Some(ParameterSchema { required: vec!["threshold".to_string()], optional: Vec::new() }),
            kind: crate::catalog::MethodKind::Constant,
            config: None,
        }])
        .unwrap();
        let registry = CalibrationRegistry::load(Vec::new()).unwrap();
        let mut methods = MethodExecutor::new();
        methods.register(method_id, || Arc::new(EchoMethod));

        let framework = ExecutorFramework::new(&catalog, &registry, &methods);
        let bundle = QuestionnaireBundle::load(single_method_bundle(method_id)).unwrap();
        let graph = full_chunk_graph();
        let mut breaker = CircuitBreaker::new(3);

        let result = framework.run(&graph, &bundle, &mut breaker);
        assert!(result.is_err(), "missing required argument must abort the run, not be skipped");
    }

    #[test]
    fn test_run_propagates_missing_calibration_contract_violation() {
        let method_id = "D1Q1.needs_calibration";
        let catalog = MethodCatalog::load(vec![CanonicalMethod {
            id: method_id.to_string(),
            name: "needs calibration".to_string(),
            positionality: LayerPositionality::Utility,
            requires_calibration: true,
            parameters: None,
            kind: crate::catalog::MethodKind::Constant,
            config: None,
        }])
        .unwrap();
        // Deliberately empty: the catalog entry requires calibration but none is registered.
        let registry = CalibrationRegistry::load(Vec::new()).unwrap();
        let mut methods = MethodExecutor::new();
        methods.register(method_id, || Arc::new(EchoMethod));

        let framework = ExecutorFramework::new(&catalog, &registry, &methods);
        let bundle = QuestionnaireBundle::load(single_method_bundle(method_id)).unwrap();
        let graph = full_chunk_graph();
        let mut breaker = CircuitBreaker::new(3);

        let result = framework.run(&graph, &bundle, &mut breaker);
        assert!(result.is_err(), "an uncalibrated requires_calibration method must abort the run, not be skipped");
    }

    #[test]
    fn test_run_propagates_fusion_failure() {
        let method_id = "D1Q1.fusion_fails";
        let catalog = MethodCatalog::load(vec![CanonicalMethod {
            id: method_id.to_string(),
            name: "fusion fails".to_string(),
            positionality: LayerPositionality::Utility,
            requires_calibration: true,
            parameters: None,
            kind: crate::catalog::MethodKind::Constant,
            config: None,
        }])
        .unwrap();
        let calibration = MethodCalibration {
            method_id: method_id.to_string(),
            version: 1,
            linear_weights: [0.1; LAYER_COUNT],
            interaction_weights: BTreeMap::new(),
            min_evidence_threshold: 0,
            // EchoMethod reports all-zero layer signals, so the fused score is
            // 0.0, which falls below this floor.
            confidence_floor: 0.5,
            confidence_ceiling: 1.0,
            provenance_hash: "deadbeef".to_string(),
        };
        let registry = CalibrationRegistry::load(vec![calibration]).unwrap();
        let mut methods = MethodExecutor::new();
        methods.register(method_id, || Arc::new(EchoMethod));

        let framework = ExecutorFramework::new(&catalog, &registry, &methods);
        let bundle = QuestionnaireBundle::load(single_method_bundle(method_id)).unwrap();
        let graph = full_chunk_graph();
        let mut breaker = CircuitBreaker::new(3);

        let result = framework.run(&graph, &bundle, &mut breaker);
        assert!(result.is_err(), "a fused confidence outside bounds must abort the run, not be silently clamped");
    }

    #[test]
    fn test_question_slot_naming() {
        let slot = QuestionSlot {
            dimension_id: 2,
            question_id: 4,
        };
        assert_eq!(slot.name(), "D2Q4");
        assert_eq!(slot.global_id(7), "D2-Q4-PA7");
    }

    fn full_bundle() -> Vec<QuestionDefinition> {
        let mut defs = Vec::new();
        for dimension_id in 1..=DIMENSION_COUNT as u8 {
            for question_id in 1..=QUESTIONS_PER_DIMENSION as u8 {
                let modality = if question_id % 2 == 0 { ScoringModality::TypeB } else { ScoringModality::TypeA };
                defs.push(QuestionDefinition {
                    slot: QuestionSlot { dimension_id, question_id },
                    modality,
                    method_sequence: Vec::new(),
                });
            }
        }
        defs
    }

    #[test]
    fn test_questionnaire_bundle_load_full_coverage() {
        let bundle = QuestionnaireBundle::load(full_bundle()).unwrap();
        assert_eq!(bundle.iter().count(), TOTAL_EXECUTOR_SLOTS);
    }

    #[test]
    fn test_questionnaire_bundle_load_incomplete_fails() {
        let mut defs = full_bundle();
        defs.pop();
        assert!(QuestionnaireBundle::load(defs).is_err());
    }

    #[test]
    fn test_questionnaire_bundle_load_duplicate_fails() {
        let mut defs = full_bundle();
        let dup = defs[0].clone();
        defs.push(dup);
        assert!(QuestionnaireBundle::load(defs).is_err());
    }

    #[test]
    fn test_total_micro_questions_is_three_hundred() {
        assert_eq!(TOTAL_MICRO_QUESTIONS, 300);
    }
}
