//! # Shared Types Crate
//!
//! This crate contains the OCPP-J wire frames, the signature block attached
//! to signable payloads, the immutable request envelope, and the closed
//! outcome type every message sender ultimately returns.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All protocol-level types are defined here.
//! - **Closed Outcomes**: A call produces exactly one [`ExchangeOutcome`]
//!   variant; failures are values, never stray panics.
//! - **Immutable Envelopes**: A [`RequestEnvelope`] never changes once sent.

pub mod envelope;
pub mod errors;
pub mod outcome;
pub mod signature;
pub mod wire;

pub use envelope::RequestEnvelope;
pub use errors::TransportError;
pub use outcome::ExchangeOutcome;
pub use signature::{Signature, SignatureStatus};
pub use wire::{CallErrorBody, Frame, MessageTypeId, RoutingHeader, WireError};
