//! The canonical method catalog: the authoritative list of every method that
//! may ever be invoked by an executor.
//!
//! A method absent from the catalog must never be invoked — the executor
//! framework checks catalog membership before dispatch, never the other way
//! around (no silent "uncatalogued methods just don't get calibrated").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calibration::MethodCalibration;
use crate::error::{CalibrationError, Result};

/// Where a method sits in the pipeline's layering, used by the calibration
/// engine to decide which of the eight calibration layers applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerPositionality {
    /// Coordinates other methods; never produces evidence directly.
    Orchestrator,
    /// Performs higher-order analysis over already-extracted signals.
    Analyzer,
    /// Transforms or normalizes chunk content for downstream methods.
    Processor,
    /// Stateless helper invoked by other methods.
    Utility,
    /// Directly answers a micro-question from chunk content.
    Executor,
    /// Reads raw input into the pipeline (chunking, normalization).
    Ingestion,
}

/// A method's declared parameter schema: named slots an `ArgRouter` must
/// fill before invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Required parameter names, in declaration order.
    pub required: Vec<String>,
    /// Optional parameter names.
    pub optional: Vec<String>,
}

/// Which generic, catalog-driven detector implements a method.
///
/// The catalog carries configuration data (`CanonicalMethod::config`)
/// instead of per-method Rust types, so the roughly two thousand catalog
/// entries all resolve to a concrete, invocable [`crate::executor::Method`]
/// built by [`crate::executor::methods::build_from_catalog`] rather than
/// requiring a hand-written implementation per method id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Fraction of a configured keyword list present in the chunk's
    /// content, case-insensitive. Config: `{"keywords": [String]}`.
    KeywordPresence,
    /// Fraction of a configured regex pattern's matches against a target
    /// count, capped at `1.0`. Config: `{"pattern": String, "target_matches": u32}`.
    RegexPresence,
    /// Causal-edge density: edges per 500 characters of content, capped at
    /// `1.0`. No config.
    CausalDensity,
    /// Whether any temporal marker was found in the chunk. No config.
    TemporalPresence,
    /// Fixed signal value, ignoring chunk content. Config: `{"value": f64}`,
    /// defaulting to `0.0` absent config. Used for placeholder entries.
    Constant,
}

impl Default for MethodKind {
    fn default() -> Self {
        Self::Constant
    }
}

/// One entry in the canonical method catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMethod {
    /// Fully-qualified method id, e.g. `"D3Q7.keyword_match"`.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Where this method sits in the layering.
    pub positionality: LayerPositionality,
    /// Whether this method requires a registered calibration to run.
    pub requires_calibration: bool,
    /// Parameter schema, if the method takes arguments beyond the chunk.
    pub parameters: Option<ParameterSchema>,
    /// Which generic detector this entry resolves to.
    #[serde(default)]
    pub kind: MethodKind,
    /// Detector-specific configuration, interpreted according to `kind`.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// The loaded, frozen catalog. Construction validates that every method
/// marked `requires_calibration` has a matching entry in the supplied
/// [`crate::calibration::CalibrationRegistry`] calibrations map — callers
/// build the catalog and registry together via [`MethodCatalog::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCatalog {
    methods: BTreeMap<String, CanonicalMethod>,
}

impl MethodCatalog {
    /// Loads a catalog from a list of methods, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns an error if any method id appears more than once.
    pub fn load(methods: Vec<CanonicalMethod>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for method in methods {
            if map.insert(method.id.clone(), method).is_some() {
                return Err(CalibrationError::DuplicateMethod {
                    method_id: map.keys().last().cloned().unwrap_or_default(),
                }
                .into());
            }
        }
        Ok(Self { methods: map })
    }

    /// Cross-checks this catalog against a calibration registry: every
    /// method marked `requires_calibration` must have a calibration.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first uncalibrated required method.
    pub fn validate_against(&self, calibrations: &BTreeMap<String, MethodCalibration>) -> Result<()> {
        for method in self.methods.values() {
            if method.requires_calibration && !calibrations.contains_key(&method.id) {
                return Err(CalibrationError::MissingRequired {
                    method_id: method.id.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Looks up a method by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CanonicalMethod> {
        self.methods.get(id)
    }

    /// Returns `true` if `id` is present in the catalog.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.methods.contains_key(id)
    }

    /// Iterates all methods in id order.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalMethod> {
        self.methods.values()
    }

    /// Returns the number of catalogued methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if the catalog has no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(id: &str, requires_calibration: bool) -> CanonicalMethod {
        CanonicalMethod {
            id: id.to_string(),
            name: id.to_string(),
            positionality: LayerPositionality::Executor,
            requires_calibration,
            parameters: None,
            kind: MethodKind::Constant,
            config: None,
        }
    }

    #[test]
    fn test_load_rejects_duplicates() {
        let result = MethodCatalog::load(vec![method("m1", false), method("m1", false)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_accepts_unique() {
        let catalog = MethodCatalog::load(vec![method("m1", false), method("m2", false)]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("m1"));
    }

    #[test]
    fn test_validate_against_missing_calibration() {
        let catalog = MethodCatalog::load(vec![method("m1", true)]).unwrap();
        let calibrations = BTreeMap::new();
        assert!(catalog.validate_against(&calibrations).is_err());
    }

    #[test]
    fn test_is_empty() {
        let catalog = MethodCatalog::load(Vec::new()).unwrap();
        assert!(catalog.is_empty());
    }
}
