//! # Error Types
//!
//! Transport-level errors shared across the engine crates.

use ocpp_routing::NetworkAddress;
use thiserror::Error;

/// Errors from handing a frame to the transport adapter.
///
/// These are local send failures; a frame that was accepted by the adapter
/// but lost in flight surfaces as a timeout, not a transport error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No live connection to the adjacent hop.
    #[error("No connection to {0}")]
    Unreachable(NetworkAddress),

    /// The connection existed but was closed before the send completed.
    #[error("Connection to {0} closed")]
    ConnectionClosed(NetworkAddress),

    /// The underlying transport reported an I/O failure.
    #[error("Transport I/O failure: {0}")]
    Io(String),
}
