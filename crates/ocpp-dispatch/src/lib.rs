//! # Dispatch Facade
//!
//! The composition layer of the exchange engine: one generic sender in place
//! of a per-message-type class zoo, and one inbound router in place of
//! per-connection handler tangles.
//!
//! ## Outbound
//!
//! [`MessageDispatcher::send_and_wait`] walks the full decision tree —
//! resolve next hop, sign, register, send, await, verify — and returns
//! exactly one [`shared_types::ExchangeOutcome`] variant. The typed
//! [`MessageDispatcher::send`] wraps it with serde on both ends.
//!
//! ## Inbound
//!
//! [`InboundRouter::route`] classifies arriving frames: responses complete
//! the pending table, calls are relayed along their hop chain or verified
//! and handed to a [`CallHandler`]. Transport disconnects fan out through
//! [`InboundRouter::connection_closed`].
//!
//! ## Ports
//!
//! The engine touches the outside world only through [`TransportAdapter`]
//! (outbound bytes) and [`CallHandler`] (application logic), so transports
//! and handlers are swappable in tests and deployments alike.

pub mod dispatcher;
pub mod errors;
pub mod ports;
pub mod router;

pub use dispatcher::MessageDispatcher;
pub use errors::DispatchError;
pub use ports::{CallHandler, TransportAdapter};
pub use router::InboundRouter;
