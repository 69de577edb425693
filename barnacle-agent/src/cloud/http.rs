//! HttpCloudProxy — HTTP client for the cloud backend

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::CloudProxy;
use crate::core::Config;
use crate::utils::AppError;
use shared::activation::{ActivateRequest, ActivateResponse, ActivationStatus, DeviceIdentity};
use shared::control::ControlCommand;
use shared::message::CanonicalMessage;
use shared::util::now_millis;

/// Request timeout for all cloud calls
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP implementation of the cloud proxy
///
/// Talks to the cloud backend's device API. The activated device id is
/// remembered after a successful `activate` and attached to every
/// subsequent call.
#[derive(Debug)]
pub struct HttpCloudProxy {
    client: reqwest::Client,
    cloud_url: String,
    /// Device id of the activated identity (set by `activate`)
    device_id: RwLock<Option<String>>,
    /// Millisecond timestamp of the last successful command pull
    last_pull: AtomicI64,
}

impl HttpCloudProxy {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            cloud_url: config.cloud_url.clone(),
            device_id: RwLock::new(None),
            last_pull: AtomicI64::new(0),
        })
    }

    async fn activated_device_id(&self) -> Result<String, AppError> {
        self.device_id
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::cloud("Not activated, no device id available"))
    }
}

#[async_trait]
impl CloudProxy for HttpCloudProxy {
    async fn activate(&self, identity: &DeviceIdentity) -> Result<ActivationStatus, AppError> {
        let url = format!("{}/api/devices/activate", self.cloud_url);
        let request = ActivateRequest {
            device_id: identity.as_str().to_string(),
            agent_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::cloud(format!("Activation request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::cloud(format!(
                "Activation endpoint returned {status}: {body}"
            )));
        }

        let data: ActivateResponse = response
            .json()
            .await
            .map_err(|e| AppError::cloud(format!("Invalid activation response: {e}")))?;

        if let Some(message) = &data.message
            && data.status != 0
        {
            tracing::warn!(status = data.status, "Cloud rejected activation: {message}");
        }

        let status = ActivationStatus::from_code(data.status);
        if status.is_success() {
            let mut cached = self.device_id.write().await;
            *cached = Some(identity.as_str().to_string());
        }

        Ok(status)
    }

    async fn send(&self, message: &CanonicalMessage) -> Result<(), AppError> {
        let device_id = self.activated_device_id().await?;
        let url = format!("{}/api/devices/data", self.cloud_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "device_id": device_id,
                "message": message,
            }))
            .send()
            .await
            .map_err(|e| AppError::cloud(format!("Message delivery failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::cloud(format!(
                "Data endpoint returned {status}: {body}"
            )));
        }

        Ok(())
    }

    async fn fetch_commands(&self) -> Result<Vec<ControlCommand>, AppError> {
        let device_id = self.activated_device_id().await?;
        let since = self.last_pull.load(Ordering::Relaxed);
        let url = format!("{}/api/devices/commands", self.cloud_url);

        let response = self
            .client
            .get(&url)
            .query(&[("device_id", device_id), ("since", since.to_string())])
            .send()
            .await
            .map_err(|e| AppError::cloud(format!("Command pull failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::cloud(format!(
                "Command endpoint returned {}",
                response.status()
            )));
        }

        // Parse response
        #[derive(Deserialize)]
        struct CommandsResponse {
            commands: Vec<ControlCommand>,
        }

        let data: CommandsResponse = response
            .json()
            .await
            .map_err(|e| AppError::cloud(format!("Invalid commands response: {e}")))?;

        self.last_pull.store(now_millis(), Ordering::Relaxed);
        Ok(data.commands)
    }
}
