//! # Request Envelope
//!
//! The immutable record of one outbound request.
//!
//! ## Correlation
//!
//! - `request_id` is the protocol-level correlation key: the eventual
//!   `CallResult`/`CallError` frame echoes it, and nothing else ties a
//!   response to its waiter.
//! - `event_tracking_id` correlates related request/response/event triples
//!   in logs only; it never affects protocol correctness.

use ocpp_routing::{NetworkAddress, NetworkPath};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Everything the dispatch facade needs to send one request.
///
/// Created per call and immutable once sent; the correlator and router only
/// ever read it.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Unique per in-flight request, caller-generated, opaque.
    pub request_id: String,
    /// Message-type name (e.g. `Heartbeat`).
    pub action: String,
    /// Log-correlation identifier for the request/response/event triple.
    pub event_tracking_id: String,
    /// The logical destination endpoint.
    pub destination: NetworkAddress,
    /// The hop chain from this node to the destination.
    pub network_path: NetworkPath,
    /// Serialized message body.
    pub payload: Value,
    /// Wall-clock deadline measured from registration.
    pub timeout: Duration,
}

impl RequestEnvelope {
    /// Build an envelope with generated request and event tracking ids.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        network_path: NetworkPath,
        payload: Value,
        timeout: Duration,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            action: action.into(),
            event_tracking_id: Uuid::new_v4().to_string(),
            destination: network_path.destination().clone(),
            network_path,
            payload,
            timeout,
        }
    }

    /// Override the generated request id (callers that track their own ids).
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Override the generated event tracking id.
    #[must_use]
    pub fn with_event_tracking_id(mut self, event_tracking_id: impl Into<String>) -> Self {
        self.event_tracking_id = event_tracking_id.into();
        self
    }
}
