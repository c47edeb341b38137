//! Cross-crate integration scenarios.

pub mod correlation;
pub mod heartbeat;
pub mod relay;
pub mod signing;
