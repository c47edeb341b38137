//! # Message Dispatcher
//!
//! The outbound facade. One `send_and_wait` call walks the whole exchange:
//! resolve the next hop, sign the payload, register the pending entry,
//! hand the frame to the transport, suspend until completion or deadline,
//! verify the response, and fold every possible failure into exactly one
//! [`ExchangeOutcome`] variant.
//!
//! ## Ordering
//!
//! The pending entry is registered **before** the transport send. A response
//! arriving in the same instant as the send therefore always finds its
//! waiter; the reverse order would race.

use crate::ports::TransportAdapter;
use ocpp_correlation::{CancelReason, Completion, RequestCorrelator};
use ocpp_routing::{NetworkAddress, NetworkPath, NextHop};
use ocpp_signing::{MessageContext, SignaturePolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_bus::{ExchangeBus, ExchangeEvent};
use shared_types::signature::attach_signatures;
use shared_types::{ExchangeOutcome, Frame, RequestEnvelope, RoutingHeader};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends requests on behalf of one node.
///
/// Cheap to share: all state lives behind `Arc`s, and every method takes
/// `&self`, so any number of concurrent sends may run on one dispatcher.
pub struct MessageDispatcher<T: TransportAdapter> {
    own_address: NetworkAddress,
    transport: Arc<T>,
    correlator: Arc<RequestCorrelator>,
    policy: Arc<SignaturePolicy>,
    bus: Arc<ExchangeBus>,
}

impl<T: TransportAdapter> MessageDispatcher<T> {
    /// Wire a dispatcher from its collaborators.
    pub fn new(
        own_address: NetworkAddress,
        transport: Arc<T>,
        correlator: Arc<RequestCorrelator>,
        policy: Arc<SignaturePolicy>,
        bus: Arc<ExchangeBus>,
    ) -> Self {
        Self {
            own_address,
            transport,
            correlator,
            policy,
            bus,
        }
    }

    /// The address this dispatcher sends as.
    #[must_use]
    pub fn own_address(&self) -> &NetworkAddress {
        &self.own_address
    }

    /// Send a typed request and parse the typed response.
    ///
    /// The single generic entry point for all message types: serializes the
    /// request, delegates to [`send_and_wait`](Self::send_and_wait), and
    /// parses the response payload. A response that arrives but does not
    /// match the expected shape is a [`ExchangeOutcome::FormatError`];
    /// retrying would reproduce it.
    pub async fn send<Req, Resp>(
        &self,
        action: &str,
        network_path: NetworkPath,
        request: &Req,
        timeout: Duration,
    ) -> ExchangeOutcome<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = match serde_json::to_value(request) {
            Ok(payload) => payload,
            Err(e) => return ExchangeOutcome::Exception(format!("request serialization: {e}")),
        };
        let envelope = RequestEnvelope::new(action, network_path, payload, timeout);

        match self.send_and_wait(envelope).await {
            ExchangeOutcome::Ok(value) => match serde_json::from_value::<Resp>(value.clone()) {
                Ok(parsed) => ExchangeOutcome::Ok(parsed),
                Err(e) => {
                    warn!(action, error = %e, "Response payload failed to parse");
                    ExchangeOutcome::FormatError(value.to_string())
                }
            },
            ExchangeOutcome::Timeout => ExchangeOutcome::Timeout,
            ExchangeOutcome::Cancelled(reason) => ExchangeOutcome::Cancelled(reason),
            ExchangeOutcome::TransportError(detail) => ExchangeOutcome::TransportError(detail),
            ExchangeOutcome::FormatError(raw) => ExchangeOutcome::FormatError(raw),
            ExchangeOutcome::ApplicationError { code, description } => {
                ExchangeOutcome::ApplicationError { code, description }
            }
            ExchangeOutcome::Exception(detail) => ExchangeOutcome::Exception(detail),
        }
    }

    /// Send one request and wait for its terminal outcome.
    ///
    /// Exactly one variant comes back per call; local faults (routing,
    /// signing, encoding) are folded into `Exception` or `TransportError`
    /// rather than propagated.
    pub async fn send_and_wait(&self, envelope: RequestEnvelope) -> ExchangeOutcome<Value> {
        let next = match envelope.network_path.next_hop(&self.own_address) {
            Ok(NextHop::Relay(next)) => next,
            Ok(NextHop::Terminal) => {
                return ExchangeOutcome::Exception(format!(
                    "own address {} is the tail of the path; nothing to send",
                    self.own_address
                ))
            }
            Err(e) => return ExchangeOutcome::Exception(format!("routing: {e}")),
        };

        let mut payload = envelope.payload.clone();
        let context = MessageContext::declared_in(&payload).map(str::to_owned);
        let signatures = match self.policy.sign(&envelope.action, context.as_deref(), &payload) {
            Ok(signatures) => signatures,
            Err(e) => return ExchangeOutcome::Exception(format!("signing: {e}")),
        };
        if let Err(e) = attach_signatures(&mut payload, &signatures) {
            return ExchangeOutcome::Exception(format!("signing: {e}"));
        }

        let frame = Frame::Call {
            request_id: envelope.request_id.clone(),
            action: envelope.action.clone(),
            payload,
            routing: Some(RoutingHeader {
                destination: envelope.destination.clone(),
                path: envelope.network_path.clone(),
            }),
        };
        let bytes = match frame.encode() {
            Ok(bytes) => bytes,
            Err(e) => return ExchangeOutcome::Exception(format!("frame encoding: {e}")),
        };

        // Register first: a same-instant response must find its waiter.
        let handle = match self.correlator.register(
            &envelope.request_id,
            envelope.network_path.clone(),
            envelope.timeout,
        ) {
            Ok(handle) => handle,
            Err(e) => return ExchangeOutcome::Exception(format!("correlation: {e}")),
        };

        if let Err(e) = self.transport.send(&next, bytes).await {
            warn!(
                request_id = %envelope.request_id,
                next_hop = %next,
                error = %e,
                "Transport refused outbound frame"
            );
            self.correlator.cancel(
                &envelope.request_id,
                CancelReason::ConnectionClosed(next.clone()),
            );
            return ExchangeOutcome::TransportError(e.to_string());
        }

        debug!(
            request_id = %envelope.request_id,
            action = %envelope.action,
            event_tracking_id = %envelope.event_tracking_id,
            next_hop = %next,
            "Request sent"
        );
        self.bus.publish(ExchangeEvent::RequestSent {
            request_id: envelope.request_id.clone(),
            action: envelope.action.clone(),
            event_tracking_id: envelope.event_tracking_id.clone(),
            destination: envelope.destination.clone(),
        });

        match handle.wait().await {
            Completion::Response(payload) => self.accept_response(&envelope, payload),
            Completion::Error(body) => ExchangeOutcome::application_error(body),
            Completion::TimedOut => {
                warn!(
                    request_id = %envelope.request_id,
                    action = %envelope.action,
                    timeout_ms = envelope.timeout.as_millis() as u64,
                    "Request timed out"
                );
                self.bus.publish(ExchangeEvent::RequestTimedOut {
                    request_id: envelope.request_id.clone(),
                    action: envelope.action.clone(),
                });
                ExchangeOutcome::Timeout
            }
            Completion::Cancelled(reason) => {
                self.bus.publish(ExchangeEvent::RequestCancelled {
                    request_id: envelope.request_id.clone(),
                    reason: reason.to_string(),
                });
                ExchangeOutcome::Cancelled(reason.to_string())
            }
        }
    }

    /// Verify an arrived response against the policy before handing it to
    /// the caller. A failed verdict is a local security fault, not an
    /// application error from the remote side.
    fn accept_response(
        &self,
        envelope: &RequestEnvelope,
        payload: Value,
    ) -> ExchangeOutcome<Value> {
        let context = MessageContext::declared_in(&payload).map(str::to_owned);
        match self.policy.verify(&envelope.action, context.as_deref(), &payload) {
            Ok(report) if report.is_acceptable() => ExchangeOutcome::Ok(payload),
            Ok(_) => {
                warn!(
                    request_id = %envelope.request_id,
                    action = %envelope.action,
                    "Response signature verification failed"
                );
                ExchangeOutcome::Exception(format!(
                    "signature verification failed for response to {}",
                    envelope.action
                ))
            }
            Err(e) => ExchangeOutcome::Exception(format!("verification: {e}")),
        }
    }
}
