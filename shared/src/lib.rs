//! Shared types for the Barnacle agent
//!
//! Common types used across the agent crates: the canonical message
//! model every transport decodes into, activation types, catalog
//! records, control commands, and small time utilities.

pub mod activation;
pub mod catalog;
pub mod control;
pub mod message;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Message model re-exports (for convenient access)
pub use message::{CanonicalMessage, InboundMessage, InboundPayload, MessageSource, TransportKind};

// Activation re-exports
pub use activation::{ActivationStatus, DeviceIdentity};
