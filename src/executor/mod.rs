//! The method executor: lazy instantiation and argument routing for every
//! method in the canonical catalog.
//!
//! Callers register a factory closure per method id, and the registry only
//! builds (and caches) the concrete `Method` the first time it is resolved.

pub mod methods;
pub mod router;

pub use methods::build_from_catalog;
pub use router::{ArgRouter, MethodArgs};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::calibration::LAYER_COUNT;
use crate::core::Chunk;
use crate::error::{ExecutorError, Result};

/// What a method produces for one invocation, before calibration fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMethodOutput {
    /// One raw signal value per calibration layer, each in `[0, 1]`.
    pub layer_signals: [f64; LAYER_COUNT],
    /// Matched element identifiers this invocation found.
    pub matched_elements: std::collections::BTreeSet<String>,
}

impl RawMethodOutput {
    /// Builds an output with all-zero layer signals and no matches — the
    /// "found nothing" result, distinct from a failure.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            layer_signals: [0.0; LAYER_COUNT],
            matched_elements: std::collections::BTreeSet::new(),
        }
    }
}

/// A single catalogued method, invoked against one chunk with routed
/// arguments.
pub trait Method: Send + Sync {
    /// Fully-qualified method id, must match its catalog entry.
    fn id(&self) -> &str;

    /// Invokes the method against a chunk's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the method cannot produce a result for this
    /// input (malformed arguments, unrecoverable internal failure).
    fn invoke(&self, chunk: &Chunk, args: &MethodArgs) -> Result<RawMethodOutput>;
}

type MethodFactory = Box<dyn Fn() -> Arc<dyn Method> + Send + Sync>;

/// Lazy registry of method factories, keyed by method id.
///
/// Methods are instantiated at most once, on first [`resolve`](Self::resolve),
/// and cached for the lifetime of the registry.
pub struct MethodExecutor {
    factories: BTreeMap<String, MethodFactory>,
    instances: Mutex<BTreeMap<String, Arc<dyn Method>>>,
}

impl std::fmt::Debug for MethodExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodExecutor")
            .field("registered", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MethodExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodExecutor {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            instances: Mutex::new(BTreeMap::new()),
        }
    }

    /// Registers a factory for `method_id`. Replaces any existing factory
    /// for the same id.
    pub fn register(&mut self, method_id: impl Into<String>, factory: impl Fn() -> Arc<dyn Method> + Send + Sync + 'static) {
        self.factories.insert(method_id.into(), Box::new(factory));
    }

    /// Resolves (instantiating on first use) the method for `method_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::MethodNotCatalogued`] if no factory was
    /// registered for `method_id`.
    pub fn resolve(&self, method_id: &str) -> Result<Arc<dyn Method>> {
        if let Some(existing) = self.instances.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(method_id) {
            return Ok(Arc::clone(existing));
        }
        let factory = self.factories.get(method_id).ok_or_else(|| ExecutorError::MethodNotCatalogued {
            method_id: method_id.to_string(),
        })?;
        let instance = factory();
        self.instances
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(method_id.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Returns the number of registered (not necessarily instantiated) methods.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.factories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoMethod {
        id: String,
    }

    impl Method for EchoMethod {
        fn id(&self) -> &str {
            &self.id
        }

        fn invoke(&self, _chunk: &Chunk, _args: &MethodArgs) -> Result<RawMethodOutput> {
            Ok(RawMethodOutput::empty())
        }
    }

    #[test]
    fn test_resolve_unregistered_fails() {
        let registry = MethodExecutor::new();
        assert!(registry.resolve("missing").is_err());
    }

    #[test]
    fn test_register_then_resolve() {
        let mut registry = MethodExecutor::new();
        registry.register("m1", || {
            Arc::new(EchoMethod { id: "m1".to_string() })
        });
        let method = registry.resolve("m1").unwrap();
        assert_eq!(method.id(), "m1");
    }

    #[test]
    fn test_resolve_caches_instance() {
        let mut registry = MethodExecutor::new();
        registry.register("m1", || Arc::new(EchoMethod { id: "m1".to_string() }));
        let first = registry.resolve("m1").unwrap();
        let second = registry.resolve("m1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_registered_count() {
        let mut registry = MethodExecutor::new();
        registry.register("m1", || Arc::new(EchoMethod { id: "m1".to_string() }));
        registry.register("m2", || Arc::new(EchoMethod { id: "m2".to_string() }));
        assert_eq!(registry.registered_count(), 2);
    }
}
