//! # End-to-End Heartbeat Scenarios
//!
//! The three terminal outcomes a sender can see for one message type — a
//! parsed response, a timeout, and an explicit remote error — plus
//! cancellation when the connection serving the path drops.

#[cfg(test)]
mod tests {
    use node_runtime::{ExchangeNode, LoopbackNetwork};
    use ocpp_dispatch::CallHandler;
    use ocpp_routing::{NetworkAddress, NetworkPath};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use shared_types::{CallErrorBody, ExchangeOutcome};
    use std::sync::Arc;
    use std::time::Duration;

    fn addr(id: &str) -> NetworkAddress {
        NetworkAddress::new(id)
    }

    fn direct() -> NetworkPath {
        NetworkPath::direct(addr("station"), addr("csms")).unwrap()
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct HeartbeatResponse {
        current_time: String,
        interval: u64,
    }

    struct FixedClockHandler;

    #[async_trait::async_trait]
    impl CallHandler for FixedClockHandler {
        async fn handle(
            &self,
            _action: &str,
            _payload: Value,
            _source: &NetworkAddress,
        ) -> Result<Value, CallErrorBody> {
            Ok(json!({"currentTime": "2024-06-01T12:00:00Z", "interval": 300}))
        }
    }

    struct RejectingHandler;

    #[async_trait::async_trait]
    impl CallHandler for RejectingHandler {
        async fn handle(
            &self,
            _action: &str,
            _payload: Value,
            _source: &NetworkAddress,
        ) -> Result<Value, CallErrorBody> {
            Err(CallErrorBody::new("GenericError", "maintenance window"))
        }
    }

    #[tokio::test]
    async fn test_heartbeat_ok() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let csms = ExchangeNode::spawn(addr("csms"), &network, 64);
        csms.router()
            .register_handler("Heartbeat", Arc::new(FixedClockHandler));

        let outcome: ExchangeOutcome<HeartbeatResponse> = station
            .dispatcher()
            .send("Heartbeat", direct(), &json!({}), Duration::from_secs(5))
            .await;

        assert_eq!(
            outcome,
            ExchangeOutcome::Ok(HeartbeatResponse {
                current_time: "2024-06-01T12:00:00Z".into(),
                interval: 300,
            })
        );
        csms.shutdown();
        station.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_timeout() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        // A peer that accepts frames but never answers.
        let (_csms, _csms_inbox) = network.attach(addr("csms"));

        let outcome: ExchangeOutcome<HeartbeatResponse> = station
            .dispatcher()
            .send("Heartbeat", direct(), &json!({}), Duration::from_secs(30))
            .await;

        assert_eq!(outcome, ExchangeOutcome::Timeout);
        assert_eq!(station.in_flight(), 0);
        station.shutdown();
    }

    #[tokio::test]
    async fn test_heartbeat_application_error() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let csms = ExchangeNode::spawn(addr("csms"), &network, 64);
        csms.router()
            .register_handler("Heartbeat", Arc::new(RejectingHandler));

        let outcome: ExchangeOutcome<HeartbeatResponse> = station
            .dispatcher()
            .send("Heartbeat", direct(), &json!({}), Duration::from_secs(5))
            .await;

        assert_eq!(
            outcome,
            ExchangeOutcome::ApplicationError {
                code: "GenericError".into(),
                description: "maintenance window".into(),
            }
        );
        csms.shutdown();
        station.shutdown();
    }

    #[tokio::test]
    async fn test_unregistered_action_is_not_supported() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let csms = ExchangeNode::spawn(addr("csms"), &network, 64);

        let outcome: ExchangeOutcome<Value> = station
            .dispatcher()
            .send("GetLog", direct(), &json!({}), Duration::from_secs(5))
            .await;

        assert_eq!(
            outcome,
            ExchangeOutcome::ApplicationError {
                code: "NotSupported".into(),
                description: "Action GetLog is not supported".into(),
            }
        );
        csms.shutdown();
        station.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_drop_cancels_pending_request() {
        let network = LoopbackNetwork::new();
        let station = Arc::new(ExchangeNode::spawn(addr("station"), &network, 64));
        let (_csms, _csms_inbox) = network.attach(addr("csms"));

        let sender = Arc::clone(&station);
        let pending = tokio::spawn(async move {
            let outcome: ExchangeOutcome<Value> = sender
                .dispatcher()
                .send("Heartbeat",
                    NetworkPath::direct(addr("station"), addr("csms")).unwrap(),
                    &json!({}),
                    Duration::from_secs(3600),
                )
                .await;
            outcome
        });

        // Let the request get registered and sent.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(station.in_flight(), 1);

        station.router().connection_closed(&addr("csms"));

        let outcome = pending.await.unwrap();
        assert!(
            matches!(outcome, ExchangeOutcome::Cancelled(ref reason) if reason.contains("csms")),
            "expected cancellation, got {outcome}"
        );
        assert_eq!(station.in_flight(), 0);
    }
}
