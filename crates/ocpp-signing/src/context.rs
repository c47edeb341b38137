//! Rule lookup keys.

use serde_json::Value;
use std::fmt;

/// The scope of one signing or verification rule.
///
/// A context names a message type (action) and optionally a JSON-LD context
/// identifier discriminating payload variants of the same action. Lookup is
/// most-specific-first: an `(action, context)` rule shadows an action-only
/// rule for messages declaring that context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageContext {
    /// Message-type name (e.g. `BootNotification`).
    pub action: String,
    /// Optional JSON-LD context identifier.
    pub context: Option<String>,
}

impl MessageContext {
    /// A context matching every message of one action.
    pub fn for_action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            context: None,
        }
    }

    /// A context matching one action with a specific JSON-LD context.
    pub fn with_context(action: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            context: Some(context.into()),
        }
    }

    /// The JSON-LD context a payload declares under `@context`, if any.
    ///
    /// This is the discriminator the dispatch path feeds into rule lookup,
    /// so context-scoped rules fire for payloads that declare one.
    #[must_use]
    pub fn declared_in(payload: &Value) -> Option<&str> {
        payload.get("@context").and_then(Value::as_str)
    }
}

impl fmt::Display for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{}[{}]", self.action, context),
            None => f.write_str(&self.action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_context_extraction() {
        assert_eq!(
            MessageContext::declared_in(&json!({"@context": "urn:example:meter", "v": 1})),
            Some("urn:example:meter")
        );
        assert_eq!(MessageContext::declared_in(&json!({"v": 1})), None);
        // A non-string declaration is no declaration.
        assert_eq!(MessageContext::declared_in(&json!({"@context": 5})), None);
    }
}
