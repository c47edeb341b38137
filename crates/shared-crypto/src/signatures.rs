//! # Ed25519 Message Signatures
//!
//! Key material and detached signatures for OCPP payload signing.
//!
//! ## Security Properties
//!
//! - Deterministic nonces (no RNG dependency at signing time)
//! - Immune to side-channel timing attacks
//! - Secret seeds zeroized on drop

use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use zeroize::Zeroize;

/// Length of a detached Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Ed25519 public key used to verify message signatures (32 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessagePublicKey([u8; 32]);

impl MessagePublicKey {
    /// Create from raw bytes, validating that they form a curve point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify a detached signature over `message`.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &MessageSignature,
    ) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Detached Ed25519 signature over a canonical payload (64 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageSignature([u8; SIGNATURE_LENGTH]);

impl MessageSignature {
    /// Wrap raw signature bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Wrap a variable-length slice, rejecting the wrong length.
    ///
    /// Wire formats carry signature bytes as base64 strings of unchecked
    /// length; this is the single place the length is enforced.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureLength {
                    expected: SIGNATURE_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Raw signature bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Signature bytes as an owned vector, for wire encoding.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// Ed25519 keypair held by a signing rule.
pub struct MessageKeyPair {
    signing_key: SigningKey,
}

impl MessageKeyPair {
    /// Generate a random keypair.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Restore a keypair from a 32-byte secret seed.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// The verification half of the pair.
    #[must_use]
    pub fn public_key(&self) -> MessagePublicKey {
        MessagePublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a canonical payload (deterministic, no RNG needed).
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> MessageSignature {
        MessageSignature(self.signing_key.sign(message).to_bytes())
    }

    /// Export the secret seed for key storage.
    #[must_use]
    pub fn to_seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Drop for MessageKeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_round_trip() {
        let keypair = MessageKeyPair::generate();
        let message = b"{\"currentTime\":\"2024-01-01T00:00:00Z\"}";

        let signature = keypair.sign(message);

        assert!(keypair.public_key().verify(message, &signature).is_ok());
    }

    #[test]
    fn test_mutated_message_fails() {
        let keypair = MessageKeyPair::generate();

        let signature = keypair.sign(b"payload-a");

        assert_eq!(
            keypair.public_key().verify(b"payload-b", &signature),
            Err(CryptoError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = MessageKeyPair::generate();
        let other = MessageKeyPair::generate();
        let message = b"test";

        let signature = signer.sign(message);

        assert!(other.public_key().verify(message, &signature).is_err());
    }

    #[test]
    fn test_from_slice_enforces_length() {
        let err = MessageSignature::from_slice(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            CryptoError::InvalidSignatureLength {
                expected: SIGNATURE_LENGTH,
                actual: 10
            }
        );
    }

    #[test]
    fn test_seed_round_trip() {
        let original = MessageKeyPair::generate();
        let restored = MessageKeyPair::from_seed(original.to_seed());

        assert_eq!(original.public_key(), restored.public_key());
    }
}
