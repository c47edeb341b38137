//! # Inbound Frame Router
//!
//! Classifies every frame arriving from the transport:
//!
//! - `CallResult`/`CallError` frames complete the pending request with the
//!   matching id, or are forwarded back along a recorded relay route;
//!   unknown ids are logged and discarded.
//! - `Call` frames are relayed toward the next hop when this node sits in
//!   the middle of the routing chain, or verified and handed to the
//!   registered [`CallHandler`] when the chain terminates here.
//! - Malformed bytes are a transport anomaly: logged, dropped, never fatal.
//!
//! A relaying node records `request_id → source` so the response, which
//! carries no routing header of its own, retraces the chain hop by hop.

use crate::errors::DispatchError;
use crate::ports::{CallHandler, TransportAdapter};
use ocpp_correlation::RequestCorrelator;
use ocpp_routing::{NetworkAddress, NetworkPath, NextHop, RoutingError};
use ocpp_signing::{MessageContext, SignaturePolicy};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared_bus::{ExchangeBus, ExchangeEvent};
use shared_types::signature::attach_signatures;
use shared_types::wire::error_code;
use shared_types::{CallErrorBody, Frame, RoutingHeader};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reply route for one relayed call: the adjacent hop it arrived from and
/// the adjacent hop it was forwarded to. A dropped connection on either
/// side orphans the entry, so both are recorded for the purge.
struct RelayRoute {
    back: NetworkAddress,
    forward: NetworkAddress,
}

/// Routes inbound frames for one node.
pub struct InboundRouter<T: TransportAdapter> {
    own_address: NetworkAddress,
    transport: Arc<T>,
    correlator: Arc<RequestCorrelator>,
    policy: Arc<SignaturePolicy>,
    bus: Arc<ExchangeBus>,
    handlers: RwLock<HashMap<String, Arc<dyn CallHandler>>>,
    /// Reply routes for calls this node relayed, by request id.
    relay_table: Mutex<HashMap<String, RelayRoute>>,
}

impl<T: TransportAdapter> InboundRouter<T> {
    /// Wire a router from its collaborators.
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
            handlers: RwLock::new(HashMap::new()),
            relay_table: Mutex::new(HashMap::new()),
        }
    }

    /// Register the handler for one message type, replacing any previous one.
    pub fn register_handler(&self, action: impl Into<String>, handler: Arc<dyn CallHandler>) {
        let action = action.into();
        debug!(action = %action, "Call handler registered");
        self.handlers.write().insert(action, handler);
    }

    /// Number of calls currently relayed through this node awaiting replies.
    #[must_use]
    pub fn relayed_in_flight(&self) -> usize {
        self.relay_table.lock().len()
    }

    /// Process one frame received from the adjacent hop `source`.
    pub async fn route(&self, source: &NetworkAddress, bytes: &[u8]) {
        let frame = match Frame::decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(source = %source, error = %e, "Discarding malformed inbound frame");
                return;
            }
        };

        match frame {
            Frame::CallResult {
                request_id,
                payload,
            } => self.route_response(request_id, payload).await,
            Frame::CallError { request_id, body } => self.route_error(request_id, body).await,
            Frame::Call {
                request_id,
                action,
                payload,
                routing,
            } => {
                self.route_call(source, request_id, action, payload, routing)
                    .await;
            }
        }
    }

    /// Cancel everything affected by a dropped transport connection.
    pub fn connection_closed(&self, address: &NetworkAddress) {
        let cancelled = self.correlator.cancel_by_hop(address);
        self.relay_table
            .lock()
            .retain(|_, route| route.back != *address && route.forward != *address);

        info!(address = %address, cancelled, "Connection closed; pending requests cancelled");
        self.bus.publish(ExchangeEvent::ConnectionClosed {
            address: address.clone(),
            cancelled,
        });
    }

    // =========================================================================
    // RESPONSE / ERROR FRAMES
    // =========================================================================

    async fn route_response(&self, request_id: String, payload: Value) {
        // Drop the table guard before forwarding: the send awaits.
        let relayed = self.relay_table.lock().remove(&request_id);
        if let Some(route) = relayed {
            let frame = Frame::CallResult {
                request_id,
                payload,
            };
            self.forward_reply(route.back, frame).await;
            return;
        }

        if self.correlator.complete_response(&request_id, payload) {
            self.bus
                .publish(ExchangeEvent::ResponseReceived { request_id });
        }
    }

    async fn route_error(&self, request_id: String, body: CallErrorBody) {
        let relayed = self.relay_table.lock().remove(&request_id);
        if let Some(route) = relayed {
            let frame = Frame::CallError { request_id, body };
            self.forward_reply(route.back, frame).await;
            return;
        }

        let code = body.code.clone();
        if self.correlator.complete_error(&request_id, body) {
            self.bus
                .publish(ExchangeEvent::ErrorReceived { request_id, code });
        }
    }

    /// Forward a reply frame one hop back toward the caller. Failures are
    /// logged; the original caller's timeout covers the loss.
    async fn forward_reply(&self, back: NetworkAddress, frame: Frame) {
        let request_id = frame.request_id().to_owned();
        if let Err(e) = self.send_frame(&back, &frame).await {
            warn!(request_id = %request_id, back_hop = %back, error = %e, "Failed to forward reply");
            return;
        }
        self.bus.publish(ExchangeEvent::FrameRelayed {
            request_id,
            next_hop: back,
        });
    }

    // =========================================================================
    // CALL FRAMES
    // =========================================================================

    async fn route_call(
        &self,
        source: &NetworkAddress,
        request_id: String,
        action: String,
        payload: Value,
        routing: Option<RoutingHeader>,
    ) {
        // A frame without the routing extension is a legacy single-hop
        // message: its route is the connection identity itself.
        let path = match routing {
            Some(header) => header.path,
            None => match NetworkPath::direct(source.clone(), self.own_address.clone()) {
                Ok(path) => path,
                Err(e) => {
                    warn!(source = %source, error = %e, "Rejecting self-addressed legacy frame");
                    return;
                }
            },
        };

        match path.next_hop(&self.own_address) {
            Ok(NextHop::Terminal) => {
                self.handle_terminal_call(source, request_id, action, payload)
                    .await;
            }
            Ok(NextHop::Relay(next)) => {
                self.relay_call(source, next, request_id, action, payload, path)
                    .await;
            }
            Err(e @ RoutingError::NotOnPath { .. }) => {
                // Configuration error: reported to the sender, never routed
                // by a default.
                warn!(
                    request_id = %request_id,
                    action = %action,
                    path = %path,
                    error = %e,
                    "Node is not on the routing path"
                );
                let body = CallErrorBody::new(error_code::GENERIC_ERROR, e.to_string());
                self.reply(source, Frame::CallError { request_id, body })
                    .await;
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Unroutable call frame");
                let body = CallErrorBody::new(error_code::GENERIC_ERROR, e.to_string());
                self.reply(source, Frame::CallError { request_id, body })
                    .await;
            }
        }
    }

    /// Forward a call unchanged to the next hop on its chain. Verification
    /// is the terminal node's job; a relay may not hold the keys.
    async fn relay_call(
        &self,
        source: &NetworkAddress,
        next: NetworkAddress,
        request_id: String,
        action: String,
        payload: Value,
        path: NetworkPath,
    ) {
        let frame = Frame::Call {
            request_id: request_id.clone(),
            action,
            payload,
            routing: Some(RoutingHeader {
                destination: path.destination().clone(),
                path,
            }),
        };

        self.relay_table.lock().insert(
            request_id.clone(),
            RelayRoute {
                back: source.clone(),
                forward: next.clone(),
            },
        );

        if let Err(e) = self.send_frame(&next, &frame).await {
            warn!(request_id = %request_id, next_hop = %next, error = %e, "Relay forwarding failed");
            self.relay_table.lock().remove(&request_id);
            let body = CallErrorBody::new(
                error_code::GENERIC_ERROR,
                format!("next hop {next} unreachable"),
            );
            self.reply(source, Frame::CallError { request_id, body })
                .await;
            return;
        }

        debug!(request_id = %request_id, next_hop = %next, "Call relayed");
        self.bus.publish(ExchangeEvent::FrameRelayed {
            request_id,
            next_hop: next,
        });
    }

    /// A call terminating at this node: verify, hand to the handler, reply.
    async fn handle_terminal_call(
        &self,
        source: &NetworkAddress,
        request_id: String,
        action: String,
        payload: Value,
    ) {
        let context = MessageContext::declared_in(&payload).map(str::to_owned);
        match self.policy.verify(&action, context.as_deref(), &payload) {
            Ok(report) if report.is_acceptable() => {}
            Ok(_) => {
                warn!(request_id = %request_id, action = %action, "Inbound call failed signature verification");
                let body = CallErrorBody::new(
                    error_code::SECURITY_ERROR,
                    "signature verification failed",
                );
                self.reply(source, Frame::CallError { request_id, body })
                    .await;
                return;
            }
            Err(e) => {
                warn!(request_id = %request_id, action = %action, error = %e, "Inbound call verification errored");
                let body = CallErrorBody::internal(e.to_string());
                self.reply(source, Frame::CallError { request_id, body })
                    .await;
                return;
            }
        }

        self.bus.publish(ExchangeEvent::CallReceived {
            request_id: request_id.clone(),
            action: action.clone(),
            source: source.clone(),
        });

        let handler = self.handlers.read().get(&action).cloned();
        let reply = match handler {
            None => Frame::CallError {
                request_id,
                body: CallErrorBody::not_supported(&action),
            },
            Some(handler) => {
                self.invoke_handler(handler, source, request_id, &action, payload)
                    .await
            }
        };

        self.reply(source, reply).await;
    }

    /// Run the handler on its own task so a panic is contained and answered
    /// with an `InternalError` instead of taking the router down.
    async fn invoke_handler(
        &self,
        handler: Arc<dyn CallHandler>,
        source: &NetworkAddress,
        request_id: String,
        action: &str,
        payload: Value,
    ) -> Frame {
        let task_action = action.to_owned();
        let task_source = source.clone();
        let joined = tokio::spawn(async move {
            handler.handle(&task_action, payload, &task_source).await
        })
        .await;

        match joined {
            Ok(Ok(mut response)) => {
                match self.sign_response(action, &mut response) {
                    Ok(()) => Frame::CallResult {
                        request_id,
                        payload: response,
                    },
                    Err(detail) => Frame::CallError {
                        request_id,
                        body: CallErrorBody::internal(detail),
                    },
                }
            }
            Ok(Err(body)) => Frame::CallError { request_id, body },
            Err(e) => {
                error!(request_id = %request_id, action, error = %e, "Call handler panicked");
                Frame::CallError {
                    request_id,
                    body: CallErrorBody::internal("call handler failed"),
                }
            }
        }
    }

    /// Sign a response payload under the same message-type scope as the
    /// request, so the caller's verification rules can cover replies.
    fn sign_response(&self, action: &str, response: &mut Value) -> Result<(), String> {
        let context = MessageContext::declared_in(response).map(str::to_owned);
        let signatures = self
            .policy
            .sign(action, context.as_deref(), response)
            .map_err(|e| format!("response signing: {e}"))?;
        attach_signatures(response, &signatures).map_err(|e| format!("response signing: {e}"))
    }

    /// Send a reply frame to the adjacent hop, logging on failure. A caller
    /// we cannot reach will observe its own timeout.
    async fn reply(&self, to: &NetworkAddress, frame: Frame) {
        if let Err(e) = self.send_frame(to, &frame).await {
            warn!(to = %to, request_id = %frame.request_id(), error = %e, "Failed to send reply");
        }
    }

    async fn send_frame(&self, to: &NetworkAddress, frame: &Frame) -> Result<(), DispatchError> {
        let bytes = frame.encode()?;
        self.transport.send(to, bytes).await?;
        Ok(())
    }
}
