//! # Exchange Events
//!
//! Defines the lifecycle notifications published by the message exchange
//! engine. Observers (loggers, metrics, UIs) subscribe to these; the engine
//! never depends on any observer having consumed them.

use ocpp_routing::NetworkAddress;
use serde::{Deserialize, Serialize};

/// All events that flow through the exchange bus.
///
/// The `event_tracking_id` on request-scoped events correlates related
/// request/response/event triples in logs; it carries no protocol meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExchangeEvent {
    /// A request frame was handed to the transport.
    RequestSent {
        /// Correlation identifier of the request.
        request_id: String,
        /// Message-type name.
        action: String,
        /// Log-correlation identifier.
        event_tracking_id: String,
        /// Logical destination of the request.
        destination: NetworkAddress,
    },

    /// A response frame completed a pending request.
    ResponseReceived {
        /// Correlation identifier of the completed request.
        request_id: String,
    },

    /// An error frame completed a pending request.
    ErrorReceived {
        /// Correlation identifier of the completed request.
        request_id: String,
        /// Error code reported by the remote endpoint.
        code: String,
    },

    /// A pending request hit its wall-clock deadline.
    RequestTimedOut {
        /// Correlation identifier of the expired request.
        request_id: String,
        /// Message-type name.
        action: String,
    },

    /// A pending request was cancelled before completing.
    RequestCancelled {
        /// Correlation identifier of the cancelled request.
        request_id: String,
        /// Why it was cancelled.
        reason: String,
    },

    /// An inbound call terminated at this node and was handed to a handler.
    CallReceived {
        /// Correlation identifier of the inbound call.
        request_id: String,
        /// Message-type name.
        action: String,
        /// The adjacent hop the frame arrived from.
        source: NetworkAddress,
    },

    /// A call frame was forwarded to the next hop on its path.
    FrameRelayed {
        /// Correlation identifier of the relayed call.
        request_id: String,
        /// The hop the frame was forwarded to.
        next_hop: NetworkAddress,
    },

    /// A transport connection dropped; affected requests were cancelled.
    ConnectionClosed {
        /// The unreachable endpoint.
        address: NetworkAddress,
        /// How many pending requests the drop cancelled.
        cancelled: usize,
    },
}

impl ExchangeEvent {
    /// The topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::RequestSent { .. }
            | Self::ResponseReceived { .. }
            | Self::ErrorReceived { .. }
            | Self::RequestTimedOut { .. }
            | Self::RequestCancelled { .. } => EventTopic::Outbound,
            Self::CallReceived { .. } => EventTopic::Inbound,
            Self::FrameRelayed { .. } => EventTopic::Relay,
            Self::ConnectionClosed { .. } => EventTopic::Transport,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Lifecycle of requests this node sent.
    Outbound,
    /// Calls terminating at this node.
    Inbound,
    /// Frames forwarded on behalf of other nodes.
    Relay,
    /// Connection-level notifications.
    Transport,
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to receive; `None` receives everything.
    pub topics: Option<Vec<EventTopic>>,
}

impl EventFilter {
    /// Receive every event.
    #[must_use]
    pub fn all() -> Self {
        Self { topics: None }
    }

    /// Receive only the given topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics: Some(topics),
        }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &ExchangeEvent) -> bool {
        match &self.topics {
            None => true,
            Some(topics) => topics.contains(&event.topic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_mapping() {
        let event = ExchangeEvent::FrameRelayed {
            request_id: "r-1".into(),
            next_hop: NetworkAddress::new("csms"),
        };
        assert_eq!(event.topic(), EventTopic::Relay);
    }

    #[test]
    fn test_filter_matches() {
        let event = ExchangeEvent::ResponseReceived {
            request_id: "r-1".into(),
        };

        assert!(EventFilter::all().matches(&event));
        assert!(EventFilter::topics(vec![EventTopic::Outbound]).matches(&event));
        assert!(!EventFilter::topics(vec![EventTopic::Relay]).matches(&event));
    }
}
