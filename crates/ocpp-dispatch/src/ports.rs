//! # Dispatch Ports
//!
//! The seams between the exchange engine and its collaborators. The engine
//! owns the correlation and routing logic; transports and application
//! handlers plug in behind these traits.

use async_trait::async_trait;
use ocpp_routing::NetworkAddress;
use serde_json::Value;
use shared_types::{CallErrorBody, TransportError};

/// Outbound port: hands encoded frames to the adjacent hop.
///
/// An `Ok` return means the adapter accepted the bytes, not that the remote
/// endpoint received them; delivery failures past this point surface as
/// timeouts. Implementations must be safe to call from concurrent tasks.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Send raw frame bytes to the connection serving `address`.
    async fn send(&self, address: &NetworkAddress, bytes: Vec<u8>) -> Result<(), TransportError>;
}

/// Inbound port: the application logic behind one message type.
///
/// Invoked for calls that terminate at this node, after signature
/// verification. The returned payload (or error body) travels back to the
/// caller as a `CallResult` (or `CallError`) frame.
#[async_trait]
pub trait CallHandler: Send + Sync {
    /// Handle one inbound call and produce its response payload.
    async fn handle(
        &self,
        action: &str,
        payload: Value,
        source: &NetworkAddress,
    ) -> Result<Value, CallErrorBody>;
}
