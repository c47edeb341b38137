//! # Event Publisher
//!
//! The publishing side of the exchange bus.

use crate::events::{EventFilter, ExchangeEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// In-memory fan-out bus for exchange lifecycle events.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. A slow or failing subscriber lags and drops events on its own
/// receiver; it can never block the publisher or other subscribers, so a
/// faulty observer cannot stall the correlation machinery.
pub struct ExchangeBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<ExchangeEvent>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity per subscriber.
    capacity: usize,
}

impl ExchangeBus {
    /// Create a bus with the default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it. Zero subscribers
    /// is not an error: observation is optional by design.
    pub fn publish(&self, event: ExchangeEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(topic = ?topic, receivers = receiver_count, "Event published");
                receiver_count
            }
            Err(_) => {
                trace!(topic = ?topic, "Event dropped (no subscribers)");
                0
            }
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published since creation.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Per-subscriber channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ExchangeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;

    fn sent_event() -> ExchangeEvent {
        ExchangeEvent::ResponseReceived {
            request_id: "r-1".into(),
        }
    }

    #[test]
    fn test_publish_no_subscribers() {
        let bus = ExchangeBus::new();

        assert_eq!(bus.publish(sent_event()), 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_with_subscribers() {
        let bus = ExchangeBus::new();

        let _sub1 = bus.subscribe(EventFilter::all());
        let _sub2 = bus.subscribe(EventFilter::topics(vec![EventTopic::Relay]));

        // Both receivers get the raw event; filtering happens on recv.
        assert_eq!(bus.publish(sent_event()), 2);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_custom_capacity() {
        let bus = ExchangeBus::with_capacity(64);
        assert_eq!(bus.capacity(), 64);
    }
}
