//! Argument routing: fills a method's declared parameter schema from the
//! values available in the current execution context.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::catalog::ParameterSchema;
use crate::error::{ExecutorError, Result};

/// Resolved arguments for one method invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodArgs(BTreeMap<String, Value>);

impl MethodArgs {
    /// Builds an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Looks up a routed argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Inserts a value, returning the builder for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }
}

/// Routes named values from an available-values pool onto a method's
/// declared [`ParameterSchema`], failing if a required slot has no source.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArgRouter;

impl ArgRouter {
    /// Creates the router.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Routes `available` onto `schema`, requiring every `schema.required`
    /// name to be present and passing through any `schema.optional` names
    /// that happen to be available.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ArgRoutingFailed`] naming the first missing
    /// required parameter.
    pub fn route(&self, method_id: &str, schema: Option<&ParameterSchema>, available: &BTreeMap<String, Value>) -> Result<MethodArgs> {
        let Some(schema) = schema else {
            return Ok(MethodArgs::new());
        };
        let mut args = MethodArgs::new();
        for name in &schema.required {
            let value = available.get(name).ok_or_else(|| ExecutorError::ArgRoutingFailed {
                method_id: method_id.to_string(),
                reason: format!("missing required parameter {name}"),
            })?;
            args = args.with(name.clone(), value.clone());
        }
        for name in &schema.optional {
            if let Some(value) = available.get(name) {
                args = args.with(name.clone(), value.clone());
            }
        }
        Ok(args)
    }
}
