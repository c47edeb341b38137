//! # Shared Bus - Exchange Event Fan-Out
//!
//! Broadcast bus for the lifecycle events of the message exchange engine.
//!
//! ## Rules
//!
//! 1. Events describe facts that already happened; they never drive the
//!    exchange machinery itself.
//! 2. Publishing never blocks: a slow subscriber lags and loses its own
//!    events, nothing else.
//! 3. Zero subscribers is a valid state; observation is strictly optional.
//!
//! ## Usage
//!
//! ```ignore
//! let bus = ExchangeBus::new();
//! let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Outbound]));
//!
//! bus.publish(ExchangeEvent::ResponseReceived { request_id: "r-1".into() });
//!
//! while let Some(event) = sub.recv().await {
//!     // observe
//! }
//! ```

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, ExchangeEvent};
pub use publisher::ExchangeBus;
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Default per-subscriber channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
