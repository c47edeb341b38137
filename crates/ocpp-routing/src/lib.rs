//! # Network Path Resolver
//!
//! Multi-hop address resolution for the OCPP message exchange engine.
//!
//! A message travelling from a charging station to the CSMS (or back) may
//! traverse one or more networking nodes (local controllers). The ordered
//! hop chain it must follow is a [`NetworkPath`]; each endpoint on the chain
//! is a [`NetworkAddress`].
//!
//! ## Design Rules
//!
//! - Paths are **immutable**: extending a path yields a new path, the input
//!   is never mutated.
//! - A node appearing twice in a chain is a routing loop and is rejected at
//!   construction time, never silently tolerated.
//! - A node asked to route a message it does not appear on reports a
//!   configuration error instead of guessing a default route.

pub mod address;
pub mod errors;
pub mod path;

pub use address::NetworkAddress;
pub use errors::RoutingError;
pub use path::{NetworkPath, NextHop};
