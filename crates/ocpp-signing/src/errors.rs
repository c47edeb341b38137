//! Signing error types.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Errors from the signature policy engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// The underlying cryptographic operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The payload carries a `signatures` field that does not decode as a
    /// signature array.
    #[error("Malformed signatures array: {0}")]
    MalformedSignatures(String),
}
