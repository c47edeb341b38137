//! # Loopback Transport
//!
//! An in-process transport fabric: every attached endpoint gets an inbox
//! channel, and sends are routed by address through a shared registry. Used
//! by the demo binary and the integration suite to wire several engine
//! nodes into one process without sockets.

use async_trait::async_trait;
use ocpp_dispatch::TransportAdapter;
use ocpp_routing::NetworkAddress;
use parking_lot::Mutex;
use shared_types::TransportError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What an endpoint receives: the adjacent sender's address and raw bytes.
pub type InboundFrame = (NetworkAddress, Vec<u8>);

type Registry = Arc<Mutex<HashMap<NetworkAddress, mpsc::UnboundedSender<InboundFrame>>>>;

/// The shared fabric endpoints attach to.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    inboxes: Registry,
}

impl LoopbackNetwork {
    /// An empty fabric.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an endpoint, replacing any previous one under that address.
    ///
    /// Returns the endpoint's sending adapter and its inbox of inbound
    /// frames.
    pub fn attach(
        &self,
        address: NetworkAddress,
    ) -> (LoopbackTransport, mpsc::UnboundedReceiver<InboundFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inboxes.lock().insert(address.clone(), sender);

        let transport = LoopbackTransport {
            own_address: address,
            inboxes: Arc::clone(&self.inboxes),
        };
        (transport, receiver)
    }

    /// Detach an endpoint; subsequent sends to it fail as unreachable.
    pub fn detach(&self, address: &NetworkAddress) {
        self.inboxes.lock().remove(address);
    }
}

/// The sending half of one attached endpoint.
pub struct LoopbackTransport {
    own_address: NetworkAddress,
    inboxes: Registry,
}

#[async_trait]
impl TransportAdapter for LoopbackTransport {
    async fn send(&self, address: &NetworkAddress, bytes: Vec<u8>) -> Result<(), TransportError> {
        let sender = self
            .inboxes
            .lock()
            .get(address)
            .cloned()
            .ok_or_else(|| TransportError::Unreachable(address.clone()))?;

        sender
            .send((self.own_address.clone(), bytes))
            .map_err(|_| TransportError::ConnectionClosed(address.clone()))
    }
}
