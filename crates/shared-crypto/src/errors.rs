//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Signature bytes have the wrong length or shape
    #[error("Invalid signature format: expected {expected} bytes, got {actual}")]
    InvalidSignatureLength {
        /// Expected signature length in bytes
        expected: usize,
        /// Actual signature length in bytes
        actual: usize,
    },

    /// Public key bytes do not decode to a valid curve point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Signing input could not be canonicalized
    #[error("Canonicalization failed: {0}")]
    CanonicalizationFailed(String),
}
