//! Correlation error types.

use thiserror::Error;

/// Errors from pending-request registration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// A request with this id is already in flight.
    ///
    /// Request ids are caller-generated; reusing one while the first request
    /// is still pending would make response matching ambiguous.
    #[error("Request id {0} is already in flight")]
    DuplicateRequestId(String),
}
