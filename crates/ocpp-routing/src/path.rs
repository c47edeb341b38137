//! Ordered hop chains and next-hop resolution.

use crate::address::NetworkAddress;
use crate::errors::RoutingError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The hop that follows the current node on a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHop {
    /// The message must be forwarded to this adjacent hop.
    Relay(NetworkAddress),
    /// The current node is the tail of the path: the final destination.
    Terminal,
}

/// An ordered, immutable sequence of hops, source first.
///
/// A path records the hops a message has traversed or must traverse. It is
/// non-empty by construction; every extension produces a new path and checks
/// the loop invariant (no address occurs twice in the chain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NetworkPath {
    hops: Vec<NetworkAddress>,
}

impl<'de> Deserialize<'de> for NetworkPath {
    // Deserialization goes through `from_hops` so a wire-supplied chain
    // cannot bypass the non-empty and no-loop invariants.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hops = Vec::<NetworkAddress>::deserialize(deserializer)?;
        Self::from_hops(hops).map_err(serde::de::Error::custom)
    }
}

impl NetworkPath {
    /// A single-element path: a message that has not left its origin.
    #[must_use]
    pub fn origin(source: NetworkAddress) -> Self {
        Self { hops: vec![source] }
    }

    /// The degenerate single-hop route `[source, destination]`.
    ///
    /// Legacy senders that address a peer over one WebSocket connection are
    /// modelled as this two-element chain.
    pub fn direct(
        source: NetworkAddress,
        destination: NetworkAddress,
    ) -> Result<Self, RoutingError> {
        Self::origin(source).append(destination)
    }

    /// Build a path from an explicit hop chain.
    ///
    /// Fails on an empty chain or on a chain that already contains a loop.
    pub fn from_hops(hops: Vec<NetworkAddress>) -> Result<Self, RoutingError> {
        let mut iter = hops.into_iter();
        let source = iter.next().ok_or(RoutingError::EmptyPath)?;
        let mut path = Self::origin(source);
        for hop in iter {
            path = path.append(hop)?;
        }
        Ok(path)
    }

    /// Return a new path with `hop` appended at the tail.
    ///
    /// Pure: `self` is left untouched. Rejects a hop that already appears
    /// anywhere in the chain — a node never legitimately occurs twice, so a
    /// duplicate is reported as a routing loop rather than recorded.
    pub fn append(&self, hop: NetworkAddress) -> Result<Self, RoutingError> {
        if self.hops.contains(&hop) {
            return Err(RoutingError::RoutingLoop { hop });
        }
        let mut hops = self.hops.clone();
        hops.push(hop);
        Ok(Self { hops })
    }

    /// Resolve the hop immediately following `own` on this path.
    ///
    /// Returns [`NextHop::Terminal`] when `own` is the tail (the final
    /// destination) and [`RoutingError::NotOnPath`] when `own` does not
    /// appear at all.
    pub fn next_hop(&self, own: &NetworkAddress) -> Result<NextHop, RoutingError> {
        let position = self
            .hops
            .iter()
            .position(|hop| hop == own)
            .ok_or_else(|| RoutingError::NotOnPath { node: own.clone() })?;

        match self.hops.get(position + 1) {
            Some(next) => Ok(NextHop::Relay(next.clone())),
            None => Ok(NextHop::Terminal),
        }
    }

    /// The path a response travels: the same chain, tail first.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut hops = self.hops.clone();
        hops.reverse();
        Self { hops }
    }

    /// The originating endpoint (head of the chain).
    #[must_use]
    pub fn source(&self) -> &NetworkAddress {
        // Non-empty by construction.
        &self.hops[0]
    }

    /// The logical destination (tail of the chain).
    #[must_use]
    pub fn destination(&self) -> &NetworkAddress {
        &self.hops[self.hops.len() - 1]
    }

    /// All hops, source first.
    #[must_use]
    pub fn hops(&self) -> &[NetworkAddress] {
        &self.hops
    }

    /// Number of hops on the chain (≥ 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Always false: paths are non-empty by construction. Kept for clippy's
    /// `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `address` appears anywhere on the chain.
    #[must_use]
    pub fn contains(&self, address: &NetworkAddress) -> bool {
        self.hops.contains(address)
    }
}

impl fmt::Display for NetworkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for hop in &self.hops {
            if !first {
                f.write_str(" -> ")?;
            }
            first = false;
            f.write_str(hop.as_str())?;
        }
        Ok(())
    }
}
