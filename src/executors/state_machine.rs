//! Per-slot execution state machine and per-method circuit breaker.

use std::collections::BTreeMap;

use crate::error::{ExecutorError, Result};

/// The state an executor slot moves through during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Not yet started.
    Pending,
    /// Resolving which chunks feed this slot.
    Routing,
    /// Invoking its method sequence.
    Invoking,
    /// Finished, evidence recorded.
    Completed,
    /// Finished, unrecoverably failed.
    Failed,
}

/// Tracks consecutive failures per method id and trips once a threshold is
/// reached, matching the teacher crate's "stop retrying a clearly broken
/// strategy" instinct from its parallel-chunking fallback path.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    threshold: u32,
    consecutive_failures: BTreeMap<String, u32>,
}

impl CircuitBreaker {
    /// Creates a breaker that trips after `threshold` consecutive failures
    /// for the same method id.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_failures: BTreeMap::new(),
        }
    }

    /// Records a successful invocation, resetting the method's counter.
    pub fn record_success(&mut self, method_id: &str) {
        self.consecutive_failures.remove(method_id);
    }

    /// Records a failed invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::CircuitOpen`] once the method's consecutive
    /// failure count reaches the configured threshold.
    pub fn record_failure(&mut self, method_id: &str) -> Result<()> {
        let count = self.consecutive_failures.entry(method_id.to_string()).or_insert(0);
        *count += 1;
        if *count >= self.threshold {
            return Err(ExecutorError::CircuitOpen {
                method_id: method_id.to_string(),
                failures: *count,
            }
            .into());
        }
        Ok(())
    }

    /// Returns `true` if the given method's circuit is currently open.
    #[must_use]
    pub fn is_open(&self, method_id: &str) -> bool {
        self.consecutive_failures.get(method_id).is_some_and(|&c| c >= self.threshold)
    }
}
