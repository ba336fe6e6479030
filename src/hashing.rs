//! Hashing System - SHA-256 Fingerprints
//!
//! Deterministic fingerprints of graphs and templates so identical
//! inputs can be recognized across compilations.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::graph::ArchitectureGraph;
use crate::templates::Template;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of a template document; key order does not matter.
pub fn compute_template_hash(template: &Template) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(template)?.as_bytes()))
}

/// graph_hash = sha256(name + canonical_graph + engine_version)
pub fn compute_graph_hash(
    graph: &ArchitectureGraph,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!("{}:{}:{}", graph.name, canonical_json(graph)?, engine_version);
    Ok(sha256_hex(combined.as_bytes()))
}
