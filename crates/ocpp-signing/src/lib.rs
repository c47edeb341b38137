//! # Signature Policy Engine
//!
//! Attaches and checks cryptographic signatures on individual messages
//! according to configurable, message-type-scoped rules.
//!
//! ## Policy Model
//!
//! Two independent rule tables, both keyed by [`MessageContext`]:
//!
//! - **Signing rules** apply to outgoing messages. Every matching rule
//!   produces one signature; zero matching rules produce zero signatures
//!   (signing is opt-in per message type, not global).
//! - **Verification rules** apply to incoming messages. `VerifyNone` skips
//!   checking, `VerifyAll` requires every attached signature to validate,
//!   `VerifyAny` requires at least one. A message type with no rule is not
//!   checked at all — neither default-deny nor default-allow.
//!
//! Different message types carry different trust requirements (a
//! BootNotification may require verification while a Heartbeat does not),
//! which is why the tables are scoped by message type rather than global.
//!
//! Rule tables are mutated at configuration time and read on every send and
//! receive; reads never block each other.

pub mod context;
pub mod errors;
pub mod policy;
pub mod rules;

pub use context::MessageContext;
pub use errors::SigningError;
pub use policy::{SignaturePolicy, VerificationReport, VerificationVerdict};
pub use rules::{SigningRule, VerificationAction, VerificationRule};
