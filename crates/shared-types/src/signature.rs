//! # Message Signature Blocks
//!
//! A signable payload carries an ordered `signatures` array of objects
//! `{keyId, algorithm, value, name?, description?, timestamp?}`. The
//! `value` bytes travel base64-encoded; the verification `status` is local
//! state and is never serialized.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload key under which the signature array is carried.
pub const SIGNATURES_FIELD: &str = "signatures";

/// Outcome of checking one signature against the key directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureStatus {
    /// Freshly produced or not yet checked.
    #[default]
    Unverified,
    /// The signature validated against its claimed key.
    Valid,
    /// The signature did not validate against its claimed key.
    Invalid,
    /// No verification key is registered under the claimed key id.
    NoKeyFound,
    /// Verification was skipped for this message type.
    NoSignature,
}

/// One signature attached to a message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// Identifier of the key pair that produced the signature.
    pub key_id: String,
    /// Signature algorithm (currently always `Ed25519`).
    pub algorithm: String,
    /// Detached signature bytes, base64 on the wire.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
    /// Optional signer identity generated per call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional human-readable correlation text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional signing timestamp, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Local verification state; never serialized.
    #[serde(skip)]
    pub status: SignatureStatus,
}

mod base64_bytes {
    use super::{Engine, BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Extract the signature array from a payload.
///
/// A payload without a `signatures` key declares zero signatures; a present
/// but malformed array is a decode error reported to the caller.
pub fn extract_signatures(payload: &Value) -> Result<Vec<Signature>, serde_json::Error> {
    match payload.get(SIGNATURES_FIELD) {
        Some(raw) => serde_json::from_value(raw.clone()),
        None => Ok(Vec::new()),
    }
}

/// Attach a signature array to a payload, replacing any existing one.
///
/// Attaching an empty slice is a no-op so unsigned message types keep their
/// original shape.
pub fn attach_signatures(
    payload: &mut Value,
    signatures: &[Signature],
) -> Result<(), serde_json::Error> {
    if signatures.is_empty() {
        return Ok(());
    }
    if let Value::Object(map) = payload {
        map.insert(
            SIGNATURES_FIELD.to_owned(),
            serde_json::to_value(signatures)?,
        );
    }
    Ok(())
}

/// A copy of the payload with the `signatures` key removed.
///
/// The canonical signing input must never include the signatures themselves.
#[must_use]
pub fn strip_signatures(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => {
            let mut stripped = map.clone();
            stripped.remove(SIGNATURES_FIELD);
            Value::Object(stripped)
        }
        other => other.clone(),
    }
}
