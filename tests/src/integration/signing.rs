//! # Signing Over The Wire
//!
//! Signature round trips through the full encode/decode path: a payload
//! signed on one node must verify on another after wire serialization, a
//! tampered payload must not, and policy for one message type must not
//! leak onto another.

#[cfg(test)]
mod tests {
    use node_runtime::{ExchangeNode, LoopbackNetwork};
    use ocpp_dispatch::CallHandler;
    use ocpp_routing::{NetworkAddress, NetworkPath};
    use ocpp_signing::{
        MessageContext, SignaturePolicy, SigningRule, VerificationAction, VerificationRule,
        VerificationVerdict,
    };
    use serde_json::{json, Value};
    use shared_crypto::MessageKeyPair;
    use shared_types::signature::attach_signatures;
    use shared_types::{CallErrorBody, ExchangeOutcome, Frame};
    use std::sync::Arc;
    use std::time::Duration;

    fn addr(id: &str) -> NetworkAddress {
        NetworkAddress::new(id)
    }

    /// A sender-side and receiver-side policy sharing one key pair.
    fn paired_policies(action: &str) -> (SignaturePolicy, SignaturePolicy) {
        let key_pair = Arc::new(MessageKeyPair::generate());

        let sender = SignaturePolicy::new();
        sender.add_signing_rule(SigningRule::new(
            MessageContext::for_action(action),
            "station-key",
            Arc::clone(&key_pair),
        ));

        let receiver = SignaturePolicy::new();
        receiver.register_verification_key("station-key", key_pair.public_key());
        receiver.set_verification_rule(VerificationRule::new(
            MessageContext::for_action(action),
            VerificationAction::VerifyAll,
        ));

        (sender, receiver)
    }

    #[test]
    fn test_signature_survives_wire_round_trip() {
        let (sender, receiver) = paired_policies("BootNotification");

        let mut payload = json!({"reason": "PowerUp", "model": "X1"});
        let signatures = sender.sign("BootNotification", None, &payload).unwrap();
        attach_signatures(&mut payload, &signatures).unwrap();

        // Through the positional array framing and back.
        let bytes = Frame::Call {
            request_id: "r-1".into(),
            action: "BootNotification".into(),
            payload,
            routing: None,
        }
        .encode()
        .unwrap();
        let Frame::Call { payload, .. } = Frame::decode(&bytes).unwrap() else {
            panic!("expected call frame");
        };

        let report = receiver.verify("BootNotification", None, &payload).unwrap();
        assert_eq!(report.verdict, VerificationVerdict::Passed);
    }

    #[test]
    fn test_single_byte_mutation_fails_verification() {
        let (sender, receiver) = paired_policies("BootNotification");

        let mut payload = json!({"reason": "PowerUp"});
        let signatures = sender.sign("BootNotification", None, &payload).unwrap();
        attach_signatures(&mut payload, &signatures).unwrap();

        let bytes = Frame::Call {
            request_id: "r-1".into(),
            action: "BootNotification".into(),
            payload,
            routing: None,
        }
        .encode()
        .unwrap();

        // Flip one byte of the signed payload in transit.
        let text = String::from_utf8(bytes).unwrap();
        let tampered = text.replacen("PowerUp", "PowerUq", 1).into_bytes();
        assert_ne!(text.as_bytes(), tampered.as_slice());

        let Frame::Call { payload, .. } = Frame::decode(&tampered).unwrap() else {
            panic!("expected call frame");
        };
        let report = receiver.verify("BootNotification", None, &payload).unwrap();
        assert_eq!(report.verdict, VerificationVerdict::Failed);
    }

    #[test]
    fn test_policy_scope_does_not_leak_across_actions() {
        let (sender, receiver) = paired_policies("BootNotification");

        // Heartbeat has no signing rule on the sender...
        assert!(sender.sign("Heartbeat", None, &json!({})).unwrap().is_empty());
        // ...and no verification rule on the receiver.
        let report = receiver.verify("Heartbeat", None, &json!({})).unwrap();
        assert_eq!(report.verdict, VerificationVerdict::NotConfigured);
    }

    /// Rejects everything; used to prove the handler is never reached when
    /// verification fails.
    struct UnreachableHandler;

    #[async_trait::async_trait]
    impl CallHandler for UnreachableHandler {
        async fn handle(
            &self,
            _action: &str,
            _payload: Value,
            _source: &NetworkAddress,
        ) -> Result<Value, CallErrorBody> {
            panic!("handler must not run for unverified calls");
        }
    }

    #[tokio::test]
    async fn test_unsigned_call_is_rejected_before_the_handler() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let csms = ExchangeNode::spawn(addr("csms"), &network, 64);

        // The CSMS demands signatures on BootNotification; the station has
        // no signing rule, so its call goes out unsigned.
        csms.policy().set_verification_rule(VerificationRule::new(
            MessageContext::for_action("BootNotification"),
            VerificationAction::VerifyAll,
        ));
        csms.router()
            .register_handler("BootNotification", Arc::new(UnreachableHandler));

        let path = NetworkPath::direct(addr("station"), addr("csms")).unwrap();
        let outcome: ExchangeOutcome<Value> = station
            .dispatcher()
            .send(
                "BootNotification",
                path,
                &json!({"reason": "PowerUp"}),
                Duration::from_secs(5),
            )
            .await;

        assert_eq!(
            outcome,
            ExchangeOutcome::ApplicationError {
                code: "SecurityError".into(),
                description: "signature verification failed".into(),
            }
        );
        csms.shutdown();
        station.shutdown();
    }

    #[tokio::test]
    async fn test_signed_round_trip_between_nodes() {
        let network = LoopbackNetwork::new();
        let station = ExchangeNode::spawn(addr("station"), &network, 64);
        let csms = ExchangeNode::spawn(addr("csms"), &network, 64);

        let station_key = Arc::new(MessageKeyPair::generate());
        let csms_key = Arc::new(MessageKeyPair::generate());
        let context = MessageContext::for_action("BootNotification");

        station.policy().add_signing_rule(SigningRule::new(
            context.clone(),
            "station-key",
            Arc::clone(&station_key),
        ));
        station
            .policy()
            .register_verification_key("csms-key", csms_key.public_key());
        station.policy().set_verification_rule(VerificationRule::new(
            context.clone(),
            VerificationAction::VerifyAll,
        ));

        csms.policy().add_signing_rule(SigningRule::new(
            context.clone(),
            "csms-key",
            Arc::clone(&csms_key),
        ));
        csms.policy()
            .register_verification_key("station-key", station_key.public_key());
        csms.policy().set_verification_rule(VerificationRule::new(
            context,
            VerificationAction::VerifyAll,
        ));

        struct AcceptingHandler;

        #[async_trait::async_trait]
        impl CallHandler for AcceptingHandler {
            async fn handle(
                &self,
                _action: &str,
                _payload: Value,
                _source: &NetworkAddress,
            ) -> Result<Value, CallErrorBody> {
                Ok(json!({"status": "Accepted", "interval": 300}))
            }
        }
        csms.router()
            .register_handler("BootNotification", Arc::new(AcceptingHandler));

        let path = NetworkPath::direct(addr("station"), addr("csms")).unwrap();
        let outcome: ExchangeOutcome<Value> = station
            .dispatcher()
            .send(
                "BootNotification",
                path,
                &json!({"reason": "PowerUp"}),
                Duration::from_secs(5),
            )
            .await;

        // The response verified on the station side; its signatures ride
        // along in the returned payload.
        let ExchangeOutcome::Ok(response) = outcome else {
            panic!("expected a verified response, got {outcome}");
        };
        assert_eq!(response["status"], "Accepted");
        assert!(response.get("signatures").is_some());

        csms.shutdown();
        station.shutdown();
    }
}
