//! Internal dispatch errors.

use shared_types::{TransportError, WireError};
use thiserror::Error;

/// Failures while encoding or forwarding a frame inside the router.
///
/// These never reach callers of the facade; the router logs them (and, where
/// a source hop is known, answers with a `CallError`).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    /// Frame encoding failed.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The transport refused the send.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
