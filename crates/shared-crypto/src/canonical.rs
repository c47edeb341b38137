//! # Canonical JSON
//!
//! Canonical serialization of signing input.
//!
//! Ed25519 signs bytes, but the engine signs JSON payloads that may be
//! re-serialized with different key orderings at every hop. The canonical
//! form sorts object keys recursively so that two semantically equal
//! payloads always produce identical signing input.

use crate::CryptoError;
use serde_json::{Map, Value};

/// Serialize a JSON value to its canonical byte form.
///
/// Object keys are sorted lexicographically at every nesting level; array
/// order is preserved (it is semantically significant). Numbers, strings,
/// booleans and null are emitted as `serde_json` renders them.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>, CryptoError> {
    let normalized = normalize(value);
    serde_json::to_vec(&normalized).map_err(|e| CryptoError::CanonicalizationFailed(e.to_string()))
}

/// Rebuild a value with all object keys sorted.
///
/// `serde_json::Map` preserves insertion order by default, so inserting in
/// sorted key order fixes the serialized ordering.
fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), normalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}
