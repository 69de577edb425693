//! Control command types
//!
//! Commands pushed down from the cloud toward a local endpoint. The
//! control channel re-emits the payload as a UDP datagram to exactly
//! the tagged target address.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// A cloud-originated actuation/control command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Local endpoint the payload is re-emitted to
    pub target: SocketAddr,
    /// Opaque command payload, forwarded verbatim
    pub payload: serde_json::Value,
}

impl ControlCommand {
    pub fn new(target: SocketAddr, payload: serde_json::Value) -> Self {
        Self { target, payload }
    }
}
