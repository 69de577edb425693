//! CommandWorker — background worker that pulls control commands
//!
//! Periodically polls the cloud proxy for pending actuation commands
//! and forwards them into the control channel. Pull errors are logged
//! and do not stop the agent; a push-capable connector (mqtt) may feed
//! the same channel from its own subscription instead.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::CloudProxy;
use shared::control::ControlCommand;

/// Poll interval for pending commands
const POLL_INTERVAL_SECS: u64 = 30;

pub struct CommandWorker {
    proxy: Arc<dyn CloudProxy>,
    tx: mpsc::Sender<ControlCommand>,
    shutdown: CancellationToken,
    poll_interval: Duration,
}

impl CommandWorker {
    pub fn new(
        proxy: Arc<dyn CloudProxy>,
        tx: mpsc::Sender<ControlCommand>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            proxy,
            tx,
            shutdown,
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
        }
    }

    /// Override the poll interval (tests)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the command worker
    ///
    /// 1. Poll `fetch_commands` on the interval
    /// 2. Forward each command into the control channel
    /// 3. Stop on shutdown signal
    pub async fn run(self) {
        tracing::info!("CommandWorker started");

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("CommandWorker shutting down");
                    break;
                }

                _ = interval.tick() => {
                    match self.proxy.fetch_commands().await {
                        Ok(commands) => {
                            for command in commands {
                                if self.tx.send(command).await.is_err() {
                                    tracing::info!("Control channel closed, CommandWorker stopping");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Command pull failed: {e}");
                        }
                    }
                }
            }
        }

        tracing::info!("CommandWorker stopped");
    }
}
