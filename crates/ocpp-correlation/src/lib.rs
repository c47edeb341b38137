//! # Request Correlator
//!
//! Tracks every in-flight request and matches inbound response and error
//! frames back to the waiting caller.
//!
//! ## State Machine
//!
//! ```text
//! Created ──register──→ Sent ──┬──→ Completed(Response)
//!                              ├──→ Completed(Error)
//!                              ├──→ Cancelled
//!                              └──→ TimedOut
//! ```
//!
//! Terminal states are final. The completion slot is single-assignment
//! (a `tokio::sync::oneshot` channel), so a duplicate or late frame can
//! never complete a request twice; it is logged and discarded.
//!
//! ## Concurrency
//!
//! The pending table is the single shared mutable resource. Registration,
//! completion, timeout expiry and cancellation may run concurrently from
//! different tasks; every transition removes the entry under one lock
//! acquisition, so there are no lost updates.

pub mod correlator;
pub mod errors;

pub use correlator::{CancelReason, Completion, PendingHandle, RequestCorrelator};
pub use errors::CorrelationError;
