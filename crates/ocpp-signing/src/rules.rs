//! Signing and verification rule definitions.

use crate::context::MessageContext;
use chrono::{DateTime, Utc};
use serde_json::Value;
use shared_crypto::MessageKeyPair;
use std::fmt;
use std::sync::Arc;

/// Generator for a per-call string field on a signature (name, description).
///
/// A pure function of the message being signed; allows, e.g., per-call
/// identity or correlation text.
pub type TextGenerator = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Generator for the signature timestamp.
pub type TimestampGenerator = Arc<dyn Fn(&Value) -> Option<DateTime<Utc>> + Send + Sync>;

/// One outgoing-signing rule.
///
/// Every rule matching a message produces one signature with the rule's key
/// pair, its fields populated by the generators evaluated against the
/// message instance.
#[derive(Clone)]
pub struct SigningRule {
    /// The message scope this rule applies to.
    pub context: MessageContext,
    /// Identifier carried as `keyId` on produced signatures.
    pub key_id: String,
    /// Asymmetric key material.
    pub key_pair: Arc<MessageKeyPair>,
    /// Generates the optional `name` field.
    pub name_generator: TextGenerator,
    /// Generates the optional `description` field.
    pub description_generator: TextGenerator,
    /// Generates the optional `timestamp` field.
    pub timestamp_generator: TimestampGenerator,
}

impl SigningRule {
    /// A rule with defaults: no name, no description, timestamp = now.
    pub fn new(
        context: MessageContext,
        key_id: impl Into<String>,
        key_pair: Arc<MessageKeyPair>,
    ) -> Self {
        Self {
            context,
            key_id: key_id.into(),
            key_pair,
            name_generator: Arc::new(|_| None),
            description_generator: Arc::new(|_| None),
            timestamp_generator: Arc::new(|_| Some(Utc::now())),
        }
    }

    /// Replace the name generator.
    #[must_use]
    pub fn with_name_generator(mut self, generator: TextGenerator) -> Self {
        self.name_generator = generator;
        self
    }

    /// Replace the description generator.
    #[must_use]
    pub fn with_description_generator(mut self, generator: TextGenerator) -> Self {
        self.description_generator = generator;
        self
    }

    /// Replace the timestamp generator.
    #[must_use]
    pub fn with_timestamp_generator(mut self, generator: TimestampGenerator) -> Self {
        self.timestamp_generator = generator;
        self
    }
}

impl fmt::Debug for SigningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Generators and key material are opaque.
        f.debug_struct("SigningRule")
            .field("context", &self.context)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// What an incoming-verification rule demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationAction {
    /// Skip checking; attached signatures are marked as skipped.
    VerifyNone,
    /// At least one attached signature must validate.
    VerifyAny,
    /// Every attached signature must validate.
    VerifyAll,
}

/// One incoming-verification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRule {
    /// The message scope this rule applies to.
    pub context: MessageContext,
    /// The demanded verification behavior.
    pub action: VerificationAction,
}

impl VerificationRule {
    /// Build a rule.
    pub fn new(context: MessageContext, action: VerificationAction) -> Self {
        Self { context, action }
    }
}
