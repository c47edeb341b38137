//! # Exchange Engine Test Suite
//!
//! Unified test crate covering the cross-crate behavior of the exchange
//! engine.
//!
//! ## Structure
//!
//! ```text
//! tests/src/integration/
//! ├── correlation.rs    # Concurrency, exactly-once, timeout + late frames
//! ├── heartbeat.rs      # End-to-end request scenarios over loopback nodes
//! ├── relay.rs          # Multi-hop forwarding across a three-node path
//! └── signing.rs        # Signature round trips over the wire
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ocpp-tests
//!
//! # By area
//! cargo test -p ocpp-tests integration::heartbeat
//! ```

pub mod integration;
