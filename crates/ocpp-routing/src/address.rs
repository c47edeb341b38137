//! Endpoint addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one endpoint in a deployment.
///
/// An address names a charging station, a networking node, or the CSMS.
/// Addresses are unique within a deployment; equality is value-based.
/// The engine never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkAddress(String);

impl NetworkAddress {
    /// Create an address from any string-like identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty identifier, which no deployment should produce.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetworkAddress {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NetworkAddress {
    fn from(id: String) -> Self {
        Self(id)
    }
}
