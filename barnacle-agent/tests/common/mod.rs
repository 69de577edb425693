#![allow(dead_code)]

//! Shared test fixtures: a scripted in-memory cloud proxy and config
//! helpers.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

use barnacle_agent::Config;
use barnacle_agent::cloud::CloudProxy;
use barnacle_agent::utils::AppError;
use shared::activation::{ActivationStatus, DeviceIdentity};
use shared::control::ControlCommand;
use shared::message::CanonicalMessage;

/// Scripted cloud proxy recording every call
#[derive(Debug)]
pub struct StubCloudProxy {
    /// Status code returned by `activate`
    pub activate_status: i32,
    /// When true, `send` fails with a cloud error
    pub fail_send: bool,
    /// Recorded canonical messages, in send order
    pub sent: Mutex<Vec<CanonicalMessage>>,
    /// Device ids passed to `activate`
    pub activations: Mutex<Vec<String>>,
    /// Commands handed out by the next `fetch_commands` call
    pub pending_commands: Mutex<Vec<ControlCommand>>,
}

impl StubCloudProxy {
    pub fn with_status(status: i32) -> Self {
        Self {
            activate_status: status,
            fail_send: false,
            sent: Mutex::new(Vec::new()),
            activations: Mutex::new(Vec::new()),
            pending_commands: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_status(0)
    }

    pub fn failing_send() -> Self {
        Self {
            fail_send: true,
            ..Self::succeeding()
        }
    }

    pub async fn sent_names(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.name.clone()).collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn queue_command(&self, command: ControlCommand) {
        self.pending_commands.lock().await.push(command);
    }
}

#[async_trait]
impl CloudProxy for StubCloudProxy {
    async fn activate(&self, identity: &DeviceIdentity) -> Result<ActivationStatus, AppError> {
        self.activations
            .lock()
            .await
            .push(identity.as_str().to_string());
        Ok(ActivationStatus::from_code(self.activate_status))
    }

    async fn send(&self, message: &CanonicalMessage) -> Result<(), AppError> {
        if self.fail_send {
            return Err(AppError::cloud("stub delivery failure"));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }

    async fn fetch_commands(&self) -> Result<Vec<ControlCommand>, AppError> {
        Ok(self.pending_commands.lock().await.drain(..).collect())
    }
}

/// Config rooted in a temp dir, listener ports unused (0)
pub fn test_config(dir: &tempfile::TempDir) -> Config {
    Config::with_overrides(dir.path().to_str().unwrap(), 0, 0)
}

/// Poll `check` until it returns true or the timeout elapses
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
