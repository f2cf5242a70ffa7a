//! Canonical JSON and BLAKE3 digests for build artifacts
//!
//! Model bundles and compile manifests are hashed through a canonical JSON
//! form (object keys sorted recursively, no whitespace) so that the digest
//! depends only on content, never on field or map order.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Serialize a value to canonical JSON (sorted keys, no whitespace).
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json_value = serde_json::to_value(value)
        .map_err(|e| CanonicalError::SerializationError(e.to_string()))?;

    let canonical = canonicalize_value(&json_value);
    serde_json::to_string(&canonical).map_err(|e| CanonicalError::SerializationError(e.to_string()))
}

fn canonicalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut btree = BTreeMap::new();
            for (k, v) in map {
                btree.insert(k.clone(), canonicalize_value(v));
            }
            Value::Object(btree.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(canonicalize_value).collect()),
        other => other.clone(),
    }
}

/// BLAKE3 digest of raw bytes as lowercase hex.
pub fn blake3_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// BLAKE3 digest of the canonical JSON form of `value`, as lowercase hex.
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(blake3_hex(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Manifest {
        source_blake3: String,
        bundle_blake3: String,
        trees: HashMap<String, usize>,
    }

    fn manifest(order: &[(&str, usize)]) -> Manifest {
        Manifest {
            source_blake3: "aa".to_string(),
            bundle_blake3: "bb".to_string(),
            trees: order.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_keys_are_sorted_recursively() {
        let json = to_canonical_json(&manifest(&[("service", 5), ("activity", 3)])).unwrap();
        assert_eq!(
            json,
            r#"{"bundle_blake3":"bb","source_blake3":"aa","trees":{"activity":3,"service":5}}"#
        );
    }

    #[test]
    fn test_hash_ignores_map_order() {
        let a = hash_canonical_hex(&manifest(&[("service", 5), ("activity", 3)])).unwrap();
        let b = hash_canonical_hex(&manifest(&[("activity", 3), ("service", 5)])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_raw_digest_matches_blake3() {
        assert_eq!(
            blake3_hex(b""),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }
}
