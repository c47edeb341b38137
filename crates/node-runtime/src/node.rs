//! # Node Wiring
//!
//! Assembles one exchange-engine node from its parts: correlator, policy,
//! event bus, dispatcher, inbound router, and the pump task that drains the
//! transport inbox into the router.

use crate::transport::{LoopbackNetwork, LoopbackTransport};
use ocpp_correlation::RequestCorrelator;
use ocpp_dispatch::{InboundRouter, MessageDispatcher};
use ocpp_routing::NetworkAddress;
use ocpp_signing::SignaturePolicy;
use shared_bus::ExchangeBus;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// One fully wired engine node attached to a loopback fabric.
pub struct ExchangeNode {
    address: NetworkAddress,
    network: LoopbackNetwork,
    dispatcher: Arc<MessageDispatcher<LoopbackTransport>>,
    router: Arc<InboundRouter<LoopbackTransport>>,
    correlator: Arc<RequestCorrelator>,
    policy: Arc<SignaturePolicy>,
    bus: Arc<ExchangeBus>,
    pump: JoinHandle<()>,
}

impl ExchangeNode {
    /// Attach a node to the fabric and start its inbound pump.
    pub fn spawn(
        address: NetworkAddress,
        network: &LoopbackNetwork,
        channel_capacity: usize,
    ) -> Self {
        let (transport, mut inbox) = network.attach(address.clone());
        let transport = Arc::new(transport);

        let correlator = Arc::new(RequestCorrelator::new());
        let policy = Arc::new(SignaturePolicy::new());
        let bus = Arc::new(ExchangeBus::with_capacity(channel_capacity));

        let dispatcher = Arc::new(MessageDispatcher::new(
            address.clone(),
            Arc::clone(&transport),
            Arc::clone(&correlator),
            Arc::clone(&policy),
            Arc::clone(&bus),
        ));
        let router = Arc::new(InboundRouter::new(
            address.clone(),
            transport,
            Arc::clone(&correlator),
            Arc::clone(&policy),
            Arc::clone(&bus),
        ));

        let pump_router = Arc::clone(&router);
        let pump = tokio::spawn(async move {
            while let Some((source, bytes)) = inbox.recv().await {
                pump_router.route(&source, &bytes).await;
            }
        });

        info!(address = %address, "Exchange node started");
        Self {
            address,
            network: network.clone(),
            dispatcher,
            router,
            correlator,
            policy,
            bus,
            pump,
        }
    }

    /// This node's address on the fabric.
    #[must_use]
    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }

    /// The outbound facade.
    #[must_use]
    pub fn dispatcher(&self) -> &MessageDispatcher<LoopbackTransport> {
        &self.dispatcher
    }

    /// The inbound router (handler registration, disconnect fan-out).
    #[must_use]
    pub fn router(&self) -> &InboundRouter<LoopbackTransport> {
        &self.router
    }

    /// This node's signature policy.
    #[must_use]
    pub fn policy(&self) -> &SignaturePolicy {
        &self.policy
    }

    /// This node's event bus.
    #[must_use]
    pub fn bus(&self) -> &ExchangeBus {
        &self.bus
    }

    /// Requests currently awaiting responses.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.correlator.in_flight()
    }

    /// Detach from the fabric and stop the pump. Pending requests are left
    /// to their timeouts; an orderly caller drains them first.
    pub fn shutdown(self) {
        info!(address = %self.address, "Exchange node shutting down");
        self.network.detach(&self.address);
        self.pump.abort();
    }
}
