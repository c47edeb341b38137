//! # OCPP-J Wire Frames
//!
//! The three frame kinds exchanged over a transport connection, encoded as
//! positional JSON arrays:
//!
//! ```text
//! Call:       [2, "<requestId>", "<action>", {payload}, {routing?}]
//! CallResult: [3, "<requestId>", {payload}]
//! CallError:  [4, "<requestId>", "<code>", "<description>", {details}]
//! ```
//!
//! The optional fifth `Call` element is the multi-hop routing extension. A
//! frame without it is a legacy single-hop message whose route is implicit
//! in the connection identity.

use ocpp_routing::{NetworkAddress, NetworkPath};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Well-known OCPP error codes used by the engine itself.
pub mod error_code {
    /// The receiving endpoint failed internally while handling the call.
    pub const INTERNAL_ERROR: &str = "InternalError";
    /// A requirement not covered by a more specific code was violated.
    pub const GENERIC_ERROR: &str = "GenericError";
    /// The requested action is recognized but not supported.
    pub const NOT_SUPPORTED: &str = "NotSupported";
    /// Signature verification of the call payload failed.
    pub const SECURITY_ERROR: &str = "SecurityError";
}

/// Numeric discriminator at position 0 of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageTypeId {
    /// Request frame.
    Call = 2,
    /// Successful response frame.
    CallResult = 3,
    /// Error response frame.
    CallError = 4,
}

impl MessageTypeId {
    /// Map the wire value back to a frame kind.
    #[must_use]
    pub fn from_wire(value: u64) -> Option<Self> {
        match value {
            2 => Some(Self::Call),
            3 => Some(Self::CallResult),
            4 => Some(Self::CallError),
            _ => None,
        }
    }
}

/// Multi-hop routing metadata carried on `Call` frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingHeader {
    /// The logical destination of the message.
    pub destination: NetworkAddress,
    /// The hop chain from source to destination.
    pub path: NetworkPath,
}

/// The error triple a remote endpoint returns in a `CallError` frame.
///
/// Also used by local call handlers to describe their own failures.
#[derive(Debug, Clone, PartialEq)]
pub struct CallErrorBody {
    /// Machine-readable error code (e.g. `NotSupported`).
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Free-form detail object.
    pub details: Value,
}

impl CallErrorBody {
    /// Build an error body with empty details.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            details: json!({}),
        }
    }

    /// Shorthand for an `InternalError` body.
    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(error_code::INTERNAL_ERROR, description)
    }

    /// Shorthand for a `NotSupported` body.
    pub fn not_supported(action: &str) -> Self {
        Self::new(
            error_code::NOT_SUPPORTED,
            format!("Action {action} is not supported"),
        )
    }
}

/// One decoded wire frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A request: `[2, requestId, action, payload, routing?]`.
    Call {
        /// Correlation identifier, unique per in-flight request.
        request_id: String,
        /// Message-type name (e.g. `Heartbeat`).
        action: String,
        /// Serialized message body.
        payload: Value,
        /// Multi-hop routing extension, absent on legacy single-hop frames.
        routing: Option<RoutingHeader>,
    },
    /// A successful response: `[3, requestId, payload]`.
    CallResult {
        /// Correlation identifier echoed from the request.
        request_id: String,
        /// Serialized response body.
        payload: Value,
    },
    /// An error response: `[4, requestId, code, description, details]`.
    CallError {
        /// Correlation identifier echoed from the request.
        request_id: String,
        /// The error triple.
        body: CallErrorBody,
    },
}

/// Errors from frame encoding and decoding.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WireError {
    /// The bytes are not valid JSON.
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// The top-level JSON value is not an array.
    #[error("Frame is not a JSON array")]
    NotAnArray,

    /// Position 0 is missing or not a recognized message type id.
    #[error("Unknown message type id: {0}")]
    UnknownMessageType(Value),

    /// The array has the wrong number of elements for its frame kind.
    #[error("Invalid arity for message type {type_id}: got {got} elements")]
    InvalidArity {
        /// The frame's message type id.
        type_id: u64,
        /// Number of elements received.
        got: usize,
    },

    /// A positional field has the wrong JSON type.
    #[error("Invalid field at position {position}: expected {expected}")]
    InvalidField {
        /// Array position of the offending element.
        position: usize,
        /// What the decoder expected there.
        expected: &'static str,
    },

    /// The routing extension object failed to parse.
    #[error("Invalid routing header: {0}")]
    InvalidRoutingHeader(String),
}

impl Frame {
    /// The request id every frame kind carries.
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Frame::Call { request_id, .. }
            | Frame::CallResult { request_id, .. }
            | Frame::CallError { request_id, .. } => request_id,
        }
    }

    /// The frame's message type id.
    #[must_use]
    pub fn type_id(&self) -> MessageTypeId {
        match self {
            Frame::Call { .. } => MessageTypeId::Call,
            Frame::CallResult { .. } => MessageTypeId::CallResult,
            Frame::CallError { .. } => MessageTypeId::CallError,
        }
    }

    /// Encode to the positional JSON array form.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let array = match self {
            Frame::Call {
                request_id,
                action,
                payload,
                routing,
            } => match routing {
                Some(header) => {
                    let header = serde_json::to_value(header)
                        .map_err(|e| WireError::InvalidRoutingHeader(e.to_string()))?;
                    json!([2, request_id, action, payload, header])
                }
                None => json!([2, request_id, action, payload]),
            },
            Frame::CallResult {
                request_id,
                payload,
            } => json!([3, request_id, payload]),
            Frame::CallError { request_id, body } => json!([
                4,
                request_id,
                body.code,
                body.description,
                body.details
            ]),
        };

        serde_json::to_vec(&array).map_err(|e| WireError::MalformedJson(e.to_string()))
    }

    /// Decode a frame from raw transport bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| WireError::MalformedJson(e.to_string()))?;
        let elements = value.as_array().ok_or(WireError::NotAnArray)?;

        let raw_type = elements.first().cloned().unwrap_or(Value::Null);
        let type_id = raw_type
            .as_u64()
            .and_then(MessageTypeId::from_wire)
            .ok_or(WireError::UnknownMessageType(raw_type))?;

        match type_id {
            MessageTypeId::Call => Self::decode_call(elements),
            MessageTypeId::CallResult => Self::decode_call_result(elements),
            MessageTypeId::CallError => Self::decode_call_error(elements),
        }
    }

    fn decode_call(elements: &[Value]) -> Result<Self, WireError> {
        if elements.len() != 4 && elements.len() != 5 {
            return Err(WireError::InvalidArity {
                type_id: 2,
                got: elements.len(),
            });
        }

        let request_id = string_at(elements, 1)?;
        let action = string_at(elements, 2)?;
        let payload = elements[3].clone();
        let routing = match elements.get(4) {
            Some(raw) => Some(
                serde_json::from_value(raw.clone())
                    .map_err(|e| WireError::InvalidRoutingHeader(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Frame::Call {
            request_id,
            action,
            payload,
            routing,
        })
    }

    fn decode_call_result(elements: &[Value]) -> Result<Self, WireError> {
        if elements.len() != 3 {
            return Err(WireError::InvalidArity {
                type_id: 3,
                got: elements.len(),
            });
        }

        Ok(Frame::CallResult {
            request_id: string_at(elements, 1)?,
            payload: elements[2].clone(),
        })
    }

    fn decode_call_error(elements: &[Value]) -> Result<Self, WireError> {
        if elements.len() != 5 {
            return Err(WireError::InvalidArity {
                type_id: 4,
                got: elements.len(),
            });
        }

        Ok(Frame::CallError {
            request_id: string_at(elements, 1)?,
            body: CallErrorBody {
                code: string_at(elements, 2)?,
                description: string_at(elements, 3)?,
                details: elements[4].clone(),
            },
        })
    }
}

fn string_at(elements: &[Value], position: usize) -> Result<String, WireError> {
    elements
        .get(position)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(WireError::InvalidField {
            position,
            expected: "string",
        })
}
