//! Message Handler — the single forwarding choke-point
//!
//! Every transport listener funnels into exactly one handler instance
//! through one channel. The handler validates the decoded payload,
//! canonicalizes it, and forwards it to the cloud proxy. It is
//! transport-agnostic: nothing here branches on where a message came
//! from.
//!
//! Malformed input is logged and dropped; a cloud delivery error on
//! steady-state traffic is logged and the loop keeps serving, since a
//! dropped sensor reading must never stop the agent. The registrar's
//! batch flow calls [`MessageHandler::process`] directly instead, so
//! delivery failures surface to the caller there.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cloud::CloudProxy;
use crate::message::schema;
use crate::utils::AppError;
use shared::message::{CanonicalMessage, InboundMessage};

/// Capacity of the listener → handler channel
pub const HANDLER_CHANNEL_CAPACITY: usize = 1024;

pub struct MessageHandler {
    cloud: Arc<dyn CloudProxy>,
}

impl MessageHandler {
    pub fn new(cloud: Arc<dyn CloudProxy>) -> Self {
        Self { cloud }
    }

    /// Create the channel listeners feed their decoded messages into
    pub fn channel() -> (mpsc::Sender<InboundMessage>, mpsc::Receiver<InboundMessage>) {
        mpsc::channel(HANDLER_CHANNEL_CAPACITY)
    }

    /// Validate, canonicalize and forward a single message
    ///
    /// Exactly one `CloudProxy::send` call is made per well-formed
    /// inbound message; a message with schema violations makes none.
    pub async fn process(&self, inbound: InboundMessage) -> Result<CanonicalMessage, AppError> {
        let violations = schema::validate(&inbound.payload);
        if !violations.is_empty() {
            return Err(AppError::validation(schema::describe(&violations)));
        }

        let message = CanonicalMessage::from_inbound(inbound);
        self.cloud.send(&message).await?;

        tracing::debug!(
            name = %message.name,
            transport = %message.source.transport,
            "Message forwarded to cloud"
        );
        Ok(message)
    }

    /// Start processing messages
    ///
    /// This is a long-running task that should be spawned in the
    /// background. Per-message errors are contained: they are logged
    /// and the loop continues with the next message.
    pub async fn run(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<InboundMessage>,
        shutdown: CancellationToken,
    ) {
        tracing::info!("🎯 Message handler started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Message handler shutting down");
                    break;
                }

                msg = rx.recv() => {
                    match msg {
                        Some(inbound) => {
                            let transport = inbound.source.transport;
                            if let Err(e) = self.process(inbound).await {
                                tracing::warn!(%transport, "Message dropped: {e}");
                            }
                        }
                        None => {
                            tracing::info!("Message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Message handler stopped");
    }
}
