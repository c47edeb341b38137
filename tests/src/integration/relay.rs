//! # Multi-Hop Relay Tests
//!
//! A charging station reaches the CSMS through an intermediate local
//! controller. The call travels the planned hop chain, the relay records
//! the reply route, and the response retraces the chain back to the caller.

#[cfg(test)]
mod tests {
    use node_runtime::{ExchangeNode, LoopbackNetwork};
    use ocpp_dispatch::CallHandler;
    use ocpp_routing::{NetworkAddress, NetworkPath};
    use serde_json::{json, Value};
    use shared_bus::{EventFilter, EventTopic, ExchangeEvent};
    use shared_types::{CallErrorBody, ExchangeOutcome};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn addr(id: &str) -> NetworkAddress {
        NetworkAddress::new(id)
    }

    struct EchoHandler;

    #[async_trait::async_trait]
    impl CallHandler for EchoHandler {
        async fn handle(
            &self,
            _action: &str,
            payload: Value,
            _source: &NetworkAddress,
        ) -> Result<Value, CallErrorBody> {
            Ok(json!({"echoed": payload}))
        }
    }

    #[tokio::test]
    async fn test_three_node_round_trip() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let lc = ExchangeNode::spawn(addr("lc"), &network, 64);
        let csms = ExchangeNode::spawn(addr("csms"), &network, 64);
        csms.router()
            .register_handler("BootNotification", Arc::new(EchoHandler));

        // Watch the relay work from the middle node.
        let mut relay_events = lc.bus().subscribe(EventFilter::topics(vec![EventTopic::Relay]));

        let path =
            NetworkPath::from_hops(vec![addr("station"), addr("lc"), addr("csms")]).unwrap();
        let outcome: ExchangeOutcome<Value> = station
            .dispatcher()
            .send(
                "BootNotification",
                path,
                &json!({"reason": "PowerUp"}),
                Duration::from_secs(10),
            )
            .await;

        assert_eq!(
            outcome,
            ExchangeOutcome::Ok(json!({"echoed": {"reason": "PowerUp"}}))
        );

        // The middle node forwarded the call toward the CSMS, then the
        // reply back toward the station.
        let first = timeout(Duration::from_secs(1), relay_events.recv())
            .await
            .expect("relay event")
            .expect("bus open");
        assert!(matches!(
            first,
            ExchangeEvent::FrameRelayed { next_hop, .. } if next_hop == addr("csms")
        ));
        let second = timeout(Duration::from_secs(1), relay_events.recv())
            .await
            .expect("relay event")
            .expect("bus open");
        assert!(matches!(
            second,
            ExchangeEvent::FrameRelayed { next_hop, .. } if next_hop == addr("station")
        ));
        assert_eq!(lc.router().relayed_in_flight(), 0);

        csms.shutdown();
        lc.shutdown();
        station.shutdown();
    }

    #[tokio::test]
    async fn test_misrouted_frame_is_answered_with_error() {
        let network = LoopbackNetwork::new();
        // Raw endpoint so the reply frame can be inspected directly.
        let (_station, mut station_inbox) = network.attach(addr("station"));
        let receiver = ExchangeNode::spawn(addr("lc"), &network, 64);

        // The chain names neither the receiving node nor the sender.
        let misrouted =
            NetworkPath::from_hops(vec![addr("other"), addr("elsewhere")]).unwrap();
        let frame = shared_types::Frame::Call {
            request_id: "mis-1".into(),
            action: "Heartbeat".into(),
            payload: json!({}),
            routing: Some(shared_types::RoutingHeader {
                destination: misrouted.destination().clone(),
                path: misrouted,
            }),
        }
        .encode()
        .unwrap();

        receiver.router().route(&addr("station"), &frame).await;

        // Reported to the sender, never routed by a default.
        let (from, bytes) = timeout(Duration::from_secs(1), station_inbox.recv())
            .await
            .expect("reply")
            .expect("channel open");
        assert_eq!(from, addr("lc"));
        let reply = shared_types::Frame::decode(&bytes).unwrap();
        assert!(matches!(
            reply,
            shared_types::Frame::CallError { request_id, body }
                if request_id == "mis-1" && body.code == "GenericError"
        ));
        assert_eq!(receiver.router().relayed_in_flight(), 0);

        receiver.shutdown();
    }
}
