//! # Exchange Node Runtime
//!
//! Demo entry point: wires a charging-station node and a CSMS node over the
//! in-process loopback fabric, installs signing and verification policy on
//! both sides, and performs one signed heartbeat round trip.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (optional file path as first argument, then env)
//! 2. Initialize logging (`RUST_LOG`, falling back to the configured filter)
//! 3. Spawn the two nodes and register the heartbeat handler
//! 4. Install key material and policy rules
//! 5. Send one heartbeat and log its outcome

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use node_runtime::{ExchangeNode, LoopbackNetwork, NodeConfig};
use ocpp_dispatch::CallHandler;
use ocpp_routing::{NetworkAddress, NetworkPath};
use ocpp_signing::{MessageContext, SigningRule, VerificationAction, VerificationRule};
use serde::Deserialize;
use serde_json::{json, Value};
use shared_crypto::MessageKeyPair;
use shared_types::{CallErrorBody, ExchangeOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Answers heartbeats with the current wall-clock time.
struct HeartbeatHandler;

#[async_trait]
impl CallHandler for HeartbeatHandler {
    async fn handle(
        &self,
        _action: &str,
        _payload: Value,
        source: &NetworkAddress,
    ) -> Result<Value, CallErrorBody> {
        info!(source = %source, "Heartbeat received");
        Ok(json!({
            "currentTime": Utc::now().to_rfc3339(),
            "interval": 300,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatResponse {
    current_time: String,
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config =
        NodeConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("===========================================");
    info!("  OCPP Exchange Node Runtime v0.1.0");
    info!("===========================================");

    let network = LoopbackNetwork::new();
    let station = ExchangeNode::spawn(
        NetworkAddress::new(config.address.clone()),
        &network,
        config.channel_capacity,
    );
    let csms = ExchangeNode::spawn(
        NetworkAddress::new("csms"),
        &network,
        config.channel_capacity,
    );

    csms.router()
        .register_handler("Heartbeat", Arc::new(HeartbeatHandler));

    install_policy(&station, &csms);

    let path = NetworkPath::direct(station.address().clone(), csms.address().clone())
        .context("Failed to build the station → CSMS path")?;
    let outcome: ExchangeOutcome<HeartbeatResponse> = station
        .dispatcher()
        .send("Heartbeat", path, &json!({}), config.default_timeout())
        .await;

    match &outcome {
        ExchangeOutcome::Ok(response) => {
            info!(
                current_time = %response.current_time,
                interval = response.interval,
                "Heartbeat round trip complete"
            );
        }
        other => {
            info!(outcome = %other, "Heartbeat did not complete");
        }
    }

    csms.shutdown();
    station.shutdown();
    Ok(())
}

/// Both directions of the heartbeat are signed and verified: the station
/// signs its calls, the CSMS signs its responses, and each side requires
/// every attached signature to validate.
fn install_policy(station: &ExchangeNode, csms: &ExchangeNode) {
    let station_key = Arc::new(MessageKeyPair::generate());
    let csms_key = Arc::new(MessageKeyPair::generate());
    let heartbeat = MessageContext::for_action("Heartbeat");

    station.policy().add_signing_rule(SigningRule::new(
        heartbeat.clone(),
        "station-key",
        Arc::clone(&station_key),
    ));
    station
        .policy()
        .register_verification_key("csms-key", csms_key.public_key());
    station.policy().set_verification_rule(VerificationRule::new(
        heartbeat.clone(),
        VerificationAction::VerifyAll,
    ));

    csms.policy().add_signing_rule(SigningRule::new(
        heartbeat.clone(),
        "csms-key",
        Arc::clone(&csms_key),
    ));
    csms.policy()
        .register_verification_key("station-key", station_key.public_key());
    csms.policy().set_verification_rule(VerificationRule::new(
        heartbeat,
        VerificationAction::VerifyAll,
    ));
}
