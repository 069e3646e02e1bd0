//! Content hashing and canonical JSON serialization.
//!
//! Every hash in a verification manifest is computed over *canonical* JSON:
//! object keys sorted, no insignificant whitespace. Two semantically
//! identical values must hash identically regardless of field insertion
//! order, matching the determinism discipline the rest of the pipeline
//! relies on.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{ManifestError, Result};

/// Hex-encodes the SHA-256 digest of arbitrary bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest)
}

/// Serializes a value to canonical JSON (sorted object keys, compact
/// separators) and returns its SHA-256 digest, hex-encoded.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String> {
    let canonical = canonical_json(value)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Serializes a value to canonical JSON: keys sorted lexicographically at
/// every nesting level, compact separators, no trailing newline.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized to JSON.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).map_err(|e| ManifestError::HashMismatch {
        artifact: "canonical_json".to_string(),
        expected: "serializable value".to_string(),
        actual: e.to_string(),
    })?;
    let sorted = sort_keys(value);
    serde_json::to_string(&sorted).map_err(|e| {
        ManifestError::HashMismatch {
            artifact: "canonical_json".to_string(),
            expected: "serializable value".to_string(),
            actual: e.to_string(),
        }
        .into()
    })
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            for key in keys {
                if let Some(v) = map.get(&key) {
                    sorted.insert(key, sort_keys(v.clone()));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
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
