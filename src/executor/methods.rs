//! Generic, catalog-configured method implementations.
//!
//! The canonical catalog is a ~2000-row data table, not 2000 hand-written
//! Rust types. Each row names a [`MethodKind`] and carries whatever
//! configuration that kind needs (a keyword list, a regex pattern); this
//! module is the small set of detectors those kinds dispatch to, plus
//! [`build_from_catalog`], which turns a loaded catalog directly into a
//! populated [`MethodExecutor`] with no per-method registration code at the
//! call site.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Deserialize;

use crate::calibration::LAYER_COUNT;
use crate::catalog::{MethodCatalog, MethodKind};
use crate::core::Chunk;
use crate::error::{ExecutorError, Result};
use crate::executor::router::MethodArgs;
use crate::executor::{Method, MethodExecutor, RawMethodOutput};

fn uniform_output(signal: f64, matched_elements: BTreeSet<String>) -> RawMethodOutput {
    let signal = signal.clamp(0.0, 1.0);
    RawMethodOutput {
        layer_signals: [signal; LAYER_COUNT],
        matched_elements,
    }
}

#[derive(Debug, Deserialize)]
struct KeywordPresenceConfig {
    keywords: Vec<String>,
}

/// Reports the fraction of a configured keyword list found in the chunk's
/// content (case-insensitive substring match), uniformly across all eight
/// layers. Matched elements are the keywords themselves.
struct KeywordPresenceMethod {
    id: String,
    keywords: Vec<String>,
}

impl Method for KeywordPresenceMethod {
    fn id(&self) -> &str {
        &self.id
    }

    fn invoke(&self, chunk: &Chunk, _args: &MethodArgs) -> Result<RawMethodOutput> {
        if self.keywords.is_empty() {
            return Ok(RawMethodOutput::empty());
        }
        let content = chunk.content.to_lowercase();
        let matched: BTreeSet<String> = self.keywords.iter().filter(|kw| content.contains(&kw.to_lowercase())).cloned().collect();
        let signal = matched.len() as f64 / self.keywords.len() as f64;
        Ok(uniform_output(signal, matched))
    }
}

#[derive(Debug, Deserialize)]
struct RegexPresenceConfig {
    pattern: String,
    #[serde(default = "default_target_matches")]
    target_matches: u32,
}

const fn default_target_matches() -> u32 {
    1
}

/// Reports matches of a configured regex pattern against a target count,
/// capped at `1.0`. Matched elements are the distinct matched substrings.
struct RegexPresenceMethod {
    id: String,
    pattern: Regex,
    target_matches: u32,
}

impl Method for RegexPresenceMethod {
    fn id(&self) -> &str {
        &self.id
    }

    fn invoke(&self, chunk: &Chunk, _args: &MethodArgs) -> Result<RawMethodOutput> {
        let matched: BTreeSet<String> = self.pattern.find_iter(&chunk.content).map(|m| m.as_str().to_string()).collect();
        let target = f64::from(self.target_matches.max(1));
        let signal = matched.len() as f64 / target;
        Ok(uniform_output(signal, matched))
    }
}

/// Reports causal-edge density (edges per 500 characters of content),
/// capped at `1.0`. Matched elements are `"{cause} -> {effect}"` labels.
struct CausalDensityMethod {
    id: String,
}

impl Method for CausalDensityMethod {
    fn id(&self) -> &str {
        &self.id
    }

    fn invoke(&self, chunk: &Chunk, _args: &MethodArgs) -> Result<RawMethodOutput> {
        let chars = chunk.content.chars().count().max(1);
        let density = chunk.causal_edges.len() as f64 / (chars as f64 / 500.0).max(1.0);
        let matched: BTreeSet<String> = chunk.causal_edges.iter().map(|edge| format!("{} -> {}", edge.cause, edge.effect)).collect();
        Ok(uniform_output(density, matched))
    }
}

/// Reports `1.0` if the chunk has any temporal marker, `0.0` otherwise.
/// Matched elements are the markers' raw text.
struct TemporalPresenceMethod {
    id: String,
}

impl Method for TemporalPresenceMethod {
    fn id(&self) -> &str {
        &self.id
    }

    fn invoke(&self, chunk: &Chunk, _args: &MethodArgs) -> Result<RawMethodOutput> {
        let matched: BTreeSet<String> = chunk.temporal_markers.iter().map(|marker| marker.text.clone()).collect();
        let signal = if matched.is_empty() { 0.0 } else { 1.0 };
        Ok(uniform_output(signal, matched))
    }
}

#[derive(Debug, Deserialize)]
struct ConstantConfig {
    #[serde(default)]
    value: f64,
}

/// Always reports a fixed signal, ignoring chunk content. Used for
/// placeholder catalog entries that declare no real detector configuration.
struct ConstantMethod {
    id: String,
    value: f64,
}

impl Method for ConstantMethod {
    fn id(&self) -> &str {
        &self.id
    }

    fn invoke(&self, _chunk: &Chunk, _args: &MethodArgs) -> Result<RawMethodOutput> {
        Ok(uniform_output(self.value, BTreeSet::new()))
    }
}

fn parse_config<T: for<'de> Deserialize<'de>>(method_id: &str, config: Option<&serde_json::Value>) -> Result<T> {
    // Absent config is "use every field's default", not "deserialize null":
    // an empty object lets `#[serde(default)]` fields fill themselves in.
    let value = config.cloned().unwrap_or_else(|| serde_json::json!({}));
    serde_json::from_value(value).map_err(|err| {
        ExecutorError::ArgRoutingFailed {
            method_id: method_id.to_string(),
            reason: format!("invalid method config: {err}"),
        }
        .into()
    })
}

/// Builds one concrete [`Method`] per catalog entry from its declared
/// [`MethodKind`] and `config`, and returns a [`MethodExecutor`] with all of
/// them registered.
///
/// Unlike a hand-maintained registration call per method id, this scales to
/// the full catalog unmodified: adding a row to the catalog JSON is enough
/// to make it invocable, as long as its `kind`/`config` are well-formed.
///
/// # Errors
///
/// Returns an error if any entry's `config` does not match the shape its
/// `kind` requires (e.g. `regex_presence` with an unparsable `pattern`).
pub fn build_from_catalog(catalog: &MethodCatalog) -> Result<MethodExecutor> {
    let mut executor = MethodExecutor::new();
    for method in catalog.iter() {
        let id = method.id.clone();
        match method.kind {
            MethodKind::KeywordPresence => {
                let config: KeywordPresenceConfig = parse_config(&id, method.config.as_ref())?;
                executor.register(id.clone(), move || {
                    std::sync::Arc::new(KeywordPresenceMethod { id: id.clone(), keywords: config.keywords.clone() })
                });
            }
            MethodKind::RegexPresence => {
                let config: RegexPresenceConfig = parse_config(&id, method.config.as_ref())?;
                let pattern = Regex::new(&config.pattern).map_err(|err| ExecutorError::ArgRoutingFailed {
                    method_id: id.clone(),
                    reason: format!("invalid regex pattern: {err}"),
                })?;
                executor.register(id.clone(), move || {
                    std::sync::Arc::new(RegexPresenceMethod { id: id.clone(), pattern: pattern.clone(), target_matches: config.target_matches })
                });
            }
            MethodKind::CausalDensity => {
                executor.register(id.clone(), move || std::sync::Arc::new(CausalDensityMethod { id: id.clone() }));
            }
            MethodKind::TemporalPresence => {
                executor.register(id.clone(), move || std::sync::Arc::new(TemporalPresenceMethod { id: id.clone() }));
            }
            MethodKind::Constant => {
                let config: ConstantConfig = parse_config(&id, method.config.as_ref())?;
                executor.register(id.clone(), move || std::sync::Arc::new(ConstantMethod { id: id.clone(), value: config.value }));
            }
        }
    }
    Ok(executor)
}
