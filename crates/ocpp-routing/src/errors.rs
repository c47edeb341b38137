//! Routing error types.

use crate::address::NetworkAddress;
use thiserror::Error;

/// Errors from network path construction and resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// A path must contain at least the originating endpoint.
    #[error("Network path must not be empty")]
    EmptyPath,

    /// Appending the hop would make it appear twice in the chain.
    #[error("Routing loop: {hop} already appears in the network path")]
    RoutingLoop { hop: NetworkAddress },

    /// The resolving node does not appear in the path at all.
    ///
    /// This is a routing-configuration error on the deployment side; the
    /// engine reports it instead of falling back to a default route.
    #[error("Node {node} is not on the network path")]
    NotOnPath { node: NetworkAddress },
}
