//! # Exchange Outcomes
//!
//! The closed result type every message sender returns. Exactly one variant
//! is produced per call; the dispatch facade converts all local faults into
//! a variant, so callers never see both a panic and an outcome.

use crate::wire::CallErrorBody;
use std::fmt;

/// Terminal result of one `send_and_wait` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome<T> {
    /// The response frame arrived and parsed as the expected type.
    Ok(T),
    /// No frame arrived within the configured deadline.
    Timeout,
    /// The pending request was completed early by an external cancellation
    /// (caller-initiated or transport disconnect). Distinct from `Timeout`.
    Cancelled(String),
    /// The local send failed; nothing left this node.
    TransportError(String),
    /// A response frame arrived but failed to parse against the expected
    /// schema. Retrying would reproduce the same malformed response.
    FormatError(String),
    /// The remote endpoint explicitly returned a `CallError`.
    ApplicationError {
        /// Machine-readable error code from the remote endpoint.
        code: String,
        /// Human-readable description from the remote endpoint.
        description: String,
    },
    /// An unexpected local fault (e.g. signing key error), surfaced rather
    /// than silently swallowed.
    Exception(String),
}

impl<T> ExchangeOutcome<T> {
    /// True for the `Ok` variant.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Extract the parsed response, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// Map the parsed response, preserving every failure variant.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ExchangeOutcome<U> {
        match self {
            Self::Ok(value) => ExchangeOutcome::Ok(f(value)),
            Self::Timeout => ExchangeOutcome::Timeout,
            Self::Cancelled(reason) => ExchangeOutcome::Cancelled(reason),
            Self::TransportError(detail) => ExchangeOutcome::TransportError(detail),
            Self::FormatError(raw) => ExchangeOutcome::FormatError(raw),
            Self::ApplicationError { code, description } => {
                ExchangeOutcome::ApplicationError { code, description }
            }
            Self::Exception(detail) => ExchangeOutcome::Exception(detail),
        }
    }

    /// Build an `ApplicationError` outcome from a wire error body.
    #[must_use]
    pub fn application_error(body: CallErrorBody) -> Self {
        Self::ApplicationError {
            code: body.code,
            description: body.description,
        }
    }
}

impl<T> fmt::Display for ExchangeOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(_) => f.write_str("OK"),
            Self::Timeout => f.write_str("Timeout"),
            Self::Cancelled(reason) => write!(f, "Cancelled: {reason}"),
            Self::TransportError(detail) => write!(f, "TransportError: {detail}"),
            Self::FormatError(raw) => write!(f, "FormatError: {raw}"),
            Self::ApplicationError { code, description } => {
                write!(f, "ApplicationError[{code}]: {description}")
            }
            Self::Exception(detail) => write!(f, "Exception: {detail}"),
        }
    }
}
