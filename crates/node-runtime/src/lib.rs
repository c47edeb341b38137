//! # Node Runtime Library
//!
//! This library exposes the composition root of an exchange-engine node for
//! reuse by the demo binary and the integration suite.
//!
//! ## Modules
//!
//! - `config` - Configuration loading (file + environment) and validation
//! - `transport` - In-process loopback transport fabric
//! - `node` - Wiring: dispatcher, router, and the inbound pump task

pub mod config;
pub mod node;
pub mod transport;

pub use config::{ConfigError, NodeConfig};
pub use node::ExchangeNode;
pub use transport::{LoopbackNetwork, LoopbackTransport};
