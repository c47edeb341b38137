//! The policy engine: rule tables, key directory, sign and verify.

use crate::context::MessageContext;
use crate::errors::SigningError;
use crate::rules::{SigningRule, VerificationAction, VerificationRule};
use parking_lot::RwLock;
use serde_json::Value;
use shared_crypto::{canonical_json, MessagePublicKey, MessageSignature, SIGNATURE_ALGORITHM};
use shared_types::signature::{extract_signatures, strip_signatures};
use shared_types::{Signature, SignatureStatus};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Overall result of verifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationVerdict {
    /// No verification rule is configured for this message type; no check
    /// was performed. Distinct from a passed or failed check.
    NotConfigured,
    /// The configured rule was satisfied.
    Passed,
    /// The configured rule was violated.
    Failed,
}

/// Per-message verification output: a verdict plus every attached signature
/// with its status set.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    /// The overall verdict.
    pub verdict: VerificationVerdict,
    /// Attached signatures, statuses populated.
    pub signatures: Vec<Signature>,
}

impl VerificationReport {
    /// True unless the verdict is `Failed`.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        self.verdict != VerificationVerdict::Failed
    }
}

/// Process-wide signing and verification configuration.
///
/// Mutated only by explicit policy-management calls; read on every send and
/// receive. Reads take shared locks so concurrent sends never block each
/// other.
pub struct SignaturePolicy {
    signing: RwLock<HashMap<MessageContext, Vec<SigningRule>>>,
    verification: RwLock<HashMap<MessageContext, VerificationAction>>,
    keys: RwLock<HashMap<String, MessagePublicKey>>,
}

impl SignaturePolicy {
    /// An empty policy: nothing is signed, nothing is verified.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signing: RwLock::new(HashMap::new()),
            verification: RwLock::new(HashMap::new()),
            keys: RwLock::new(HashMap::new()),
        }
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Install a signing rule. Multiple rules may share one context; each
    /// produces its own signature.
    pub fn add_signing_rule(&self, rule: SigningRule) {
        debug!(context = %rule.context, key_id = %rule.key_id, "Installing signing rule");
        self.signing
            .write()
            .entry(rule.context.clone())
            .or_default()
            .push(rule);
    }

    /// Remove all signing rules for a context. Returns how many were removed.
    pub fn remove_signing_rules(&self, context: &MessageContext) -> usize {
        self.signing
            .write()
            .remove(context)
            .map_or(0, |rules| rules.len())
    }

    /// Install (or replace) the verification rule for a context.
    pub fn set_verification_rule(&self, rule: VerificationRule) {
        debug!(context = %rule.context, action = ?rule.action, "Installing verification rule");
        self.verification
            .write()
            .insert(rule.context, rule.action);
    }

    /// Remove the verification rule for a context.
    pub fn remove_verification_rule(&self, context: &MessageContext) -> bool {
        self.verification.write().remove(context).is_some()
    }

    /// Register a verification key under its key id.
    pub fn register_verification_key(&self, key_id: impl Into<String>, key: MessagePublicKey) {
        self.keys.write().insert(key_id.into(), key);
    }

    // =========================================================================
    // SIGNING (outgoing)
    // =========================================================================

    /// Produce signatures for an outgoing message.
    ///
    /// The signing input is the canonical form of the payload with any
    /// existing `signatures` field stripped. Zero matching rules yield an
    /// empty vector.
    pub fn sign(
        &self,
        action: &str,
        context: Option<&str>,
        payload: &Value,
    ) -> Result<Vec<Signature>, SigningError> {
        let signing = self.signing.read();
        let Some(rules) = most_specific(&signing, action, context) else {
            return Ok(Vec::new());
        };

        let input = canonical_json(&strip_signatures(payload))?;
        let mut signatures = Vec::with_capacity(rules.len());
        for rule in rules {
            let produced = rule.key_pair.sign(&input);
            signatures.push(Signature {
                key_id: rule.key_id.clone(),
                algorithm: SIGNATURE_ALGORITHM.to_owned(),
                value: produced.to_vec(),
                name: (rule.name_generator)(payload),
                description: (rule.description_generator)(payload),
                timestamp: (rule.timestamp_generator)(payload),
                status: SignatureStatus::Unverified,
            });
        }
        debug!(action, count = signatures.len(), "Signed outgoing message");
        Ok(signatures)
    }

    // =========================================================================
    // VERIFICATION (incoming)
    // =========================================================================

    /// Check an incoming message against the verification table.
    ///
    /// Every attached signature comes back with its status set. A message
    /// declaring zero signatures under `VerifyAll`/`VerifyAny` fails; a
    /// message type with no rule is not checked at all.
    pub fn verify(
        &self,
        action: &str,
        context: Option<&str>,
        payload: &Value,
    ) -> Result<VerificationReport, SigningError> {
        let mut signatures = extract_signatures(payload)
            .map_err(|e| SigningError::MalformedSignatures(e.to_string()))?;

        let rule = {
            let verification = self.verification.read();
            most_specific(&verification, action, context).copied()
        };

        let Some(rule) = rule else {
            return Ok(VerificationReport {
                verdict: VerificationVerdict::NotConfigured,
                signatures,
            });
        };

        if rule == VerificationAction::VerifyNone {
            for signature in &mut signatures {
                signature.status = SignatureStatus::NoSignature;
            }
            return Ok(VerificationReport {
                verdict: VerificationVerdict::Passed,
                signatures,
            });
        }

        if signatures.is_empty() {
            warn!(action, "Message requires signatures but carries none");
            return Ok(VerificationReport {
                verdict: VerificationVerdict::Failed,
                signatures,
            });
        }

        let input = canonical_json(&strip_signatures(payload))?;
        {
            let keys = self.keys.read();
            for signature in &mut signatures {
                signature.status = check_one(&keys, signature, &input);
            }
        }

        let valid = signatures
            .iter()
            .filter(|s| s.status == SignatureStatus::Valid)
            .count();
        let verdict = match rule {
            VerificationAction::VerifyAll if valid == signatures.len() => {
                VerificationVerdict::Passed
            }
            VerificationAction::VerifyAny if valid > 0 => VerificationVerdict::Passed,
            _ => VerificationVerdict::Failed,
        };

        if verdict == VerificationVerdict::Failed {
            warn!(
                action,
                valid,
                total = signatures.len(),
                "Signature verification failed"
            );
        }
        Ok(VerificationReport {
            verdict,
            signatures,
        })
    }
}

impl Default for SignaturePolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Check one signature against the key directory. Never treats a lookup
/// failure as valid.
fn check_one(
    keys: &HashMap<String, MessagePublicKey>,
    signature: &Signature,
    input: &[u8],
) -> SignatureStatus {
    if signature.algorithm != SIGNATURE_ALGORITHM {
        return SignatureStatus::Invalid;
    }
    let Some(key) = keys.get(&signature.key_id) else {
        return SignatureStatus::NoKeyFound;
    };
    let Ok(decoded) = MessageSignature::from_slice(&signature.value) else {
        return SignatureStatus::Invalid;
    };
    if key.verify(input, &decoded).is_ok() {
        SignatureStatus::Valid
    } else {
        SignatureStatus::Invalid
    }
}

/// Most-specific rule lookup: an exact `(action, context)` entry shadows the
/// action-only entry.
fn most_specific<'a, T>(
    table: &'a HashMap<MessageContext, T>,
    action: &str,
    context: Option<&str>,
) -> Option<&'a T> {
    if let Some(context) = context {
        let key = MessageContext::with_context(action, context);
        if let Some(found) = table.get(&key) {
            return Some(found);
        }
    }
    table.get(&MessageContext::for_action(action))
}
