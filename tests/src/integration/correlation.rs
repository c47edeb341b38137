//! # Correlation Integration Tests
//!
//! Drives the correlator through the inbound router the way a live
//! transport would: interleaved responses, duplicate frames, and frames
//! arriving after the deadline.

#[cfg(test)]
mod tests {
    use node_runtime::{ExchangeNode, LoopbackNetwork};
    use ocpp_dispatch::CallHandler;
    use ocpp_routing::{NetworkAddress, NetworkPath};
    use rand::Rng;
    use serde_json::{json, Value};
    use shared_types::{
        CallErrorBody, ExchangeOutcome, Frame, RequestEnvelope,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinSet;

    fn addr(id: &str) -> NetworkAddress {
        NetworkAddress::new(id)
    }

    /// Echoes the request payload after a random short delay, so responses
    /// come back in an order unrelated to the send order.
    struct JitteredEchoHandler;

    #[async_trait::async_trait]
    impl CallHandler for JitteredEchoHandler {
        async fn handle(
            &self,
            _action: &str,
            payload: Value,
            _source: &NetworkAddress,
        ) -> Result<Value, CallErrorBody> {
            let jitter = rand::thread_rng().gen_range(0..10);
            tokio::time::sleep(Duration::from_millis(jitter)).await;
            Ok(payload)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_requests_correlate_by_id_not_order() {
        let network = LoopbackNetwork::new();
        let station = Arc::new(ExchangeNode::spawn(addr("station"), &network, 256));
        let csms = ExchangeNode::spawn(addr("csms"), &network, 256);
        csms.router()
            .register_handler("DataTransfer", Arc::new(JitteredEchoHandler));

        let mut tasks = JoinSet::new();
        for i in 0..32u32 {
            let station = Arc::clone(&station);
            tasks.spawn(async move {
                let path = NetworkPath::direct(addr("station"), addr("csms")).unwrap();
                let outcome: ExchangeOutcome<Value> = station
                    .dispatcher()
                    .send(
                        "DataTransfer",
                        path,
                        &json!({"n": i}),
                        Duration::from_secs(10),
                    )
                    .await;
                (i, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (i, outcome) = joined.unwrap();
            // Every caller gets its own response, regardless of completion order.
            assert_eq!(outcome, ExchangeOutcome::Ok(json!({"n": i})));
        }
        assert_eq!(station.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_response_frame_completes_exactly_once() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        // Silent peer: frames are delivered by hand below.
        let (_csms, _csms_inbox) = network.attach(addr("csms"));

        let path = NetworkPath::direct(addr("station"), addr("csms")).unwrap();
        let envelope = RequestEnvelope::new(
            "Heartbeat",
            path,
            json!({}),
            Duration::from_secs(10),
        )
        .with_request_id("dup-1");

        let dispatcher_task = {
            let dispatcher = station.dispatcher();
            dispatcher.send_and_wait(envelope)
        };

        let reply = Frame::CallResult {
            request_id: "dup-1".into(),
            payload: json!({"first": true}),
        }
        .encode()
        .unwrap();

        // Deliver the same frame twice; the second must be discarded.
        let router = station.router();
        let deliver = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            router.route(&addr("csms"), &reply).await;
            router.route(&addr("csms"), &reply).await;
        };

        let (outcome, ()) = tokio::join!(dispatcher_task, deliver);
        assert_eq!(outcome, ExchangeOutcome::Ok(json!({"first": true})));
        assert_eq!(station.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_frame_after_timeout_is_discarded() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let (_csms, _csms_inbox) = network.attach(addr("csms"));

        let path = NetworkPath::direct(addr("station"), addr("csms")).unwrap();
        let envelope = RequestEnvelope::new(
            "Heartbeat",
            path,
            json!({}),
            Duration::from_secs(1),
        )
        .with_request_id("late-1");

        let outcome = station.dispatcher().send_and_wait(envelope).await;
        assert_eq!(outcome, ExchangeOutcome::Timeout);
        assert_eq!(station.in_flight(), 0);

        // The response limps in after the deadline: logged and dropped.
        let late = Frame::CallResult {
            request_id: "late-1".into(),
            payload: json!({}),
        }
        .encode()
        .unwrap();
        station.router().route(&addr("csms"), &late).await;

        assert_eq!(station.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_error_frame_resolves_to_application_error() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let (_csms, _csms_inbox) = network.attach(addr("csms"));

        let path = NetworkPath::direct(addr("station"), addr("csms")).unwrap();
        let envelope = RequestEnvelope::new(
            "SetChargingProfile",
            path,
            json!({}),
            Duration::from_secs(10),
        )
        .with_request_id("err-1");

        let router = station.router();
        let deliver = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let frame = Frame::CallError {
                request_id: "err-1".into(),
                body: CallErrorBody::new("NotSupported", "profiles not implemented"),
            }
            .encode()
            .unwrap();
            router.route(&addr("csms"), &frame).await;
        };

        let (outcome, ()) = tokio::join!(station.dispatcher().send_and_wait(envelope), deliver);
        assert_eq!(
            outcome,
            ExchangeOutcome::ApplicationError {
                code: "NotSupported".into(),
                description: "profiles not implemented".into(),
            }
        );
    }
}
