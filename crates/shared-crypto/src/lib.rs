//! # Shared Crypto - Message Signing Primitives
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `signatures` | Ed25519 key material and detached signatures |
//! | `canonical` | Canonical JSON serialization of signing input |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency at signing time
//! - **Canonical input**: Object keys recursively sorted so that two
//!   semantically equal payloads always sign to the same bytes
//! - Secret key material is zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod errors;
pub mod signatures;

// Re-exports
pub use canonical::canonical_json;
pub use errors::CryptoError;
pub use signatures::{MessageKeyPair, MessagePublicKey, MessageSignature};

/// Algorithm identifier carried in signature blocks produced by this crate.
pub const SIGNATURE_ALGORITHM: &str = "Ed25519";
