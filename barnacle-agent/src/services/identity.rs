//! Device identity resolution
//!
//! Produces the stable device identifier every other component shares.
//! The identity is a SHA-256 hardware fingerprint, computed once per
//! installation and cached on disk so it survives hardware-report
//! jitter across reboots.

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use crate::core::Config;
use crate::utils::AppError;
use shared::activation::DeviceIdentity;

/// Resolves the device identity, caching it under the data directory.
///
/// Resolution performs no internal retries; a failure is fatal to the
/// caller. Cheap enough to run before every activation attempt.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    cache_path: PathBuf,
}

impl IdentityResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            cache_path: config.identity_path(),
        }
    }

    /// Resolve the device identity
    ///
    /// Reads the cached id if one exists, otherwise computes the
    /// hardware fingerprint and persists it.
    pub async fn resolve(&self) -> Result<DeviceIdentity, AppError> {
        if let Ok(cached) = tokio::fs::read_to_string(&self.cache_path).await {
            let cached = cached.trim();
            if !cached.is_empty() {
                return Ok(DeviceIdentity::new(cached));
            }
        }

        let id = hardware_fingerprint();

        if let Some(parent) = self.cache_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::identity(format!("cannot create data dir for device id: {e}"))
            })?;
        }
        tokio::fs::write(&self.cache_path, &id)
            .await
            .map_err(|e| AppError::identity(format!("cannot persist device id: {e}")))?;

        tracing::info!("Generated device identity: {}", id);
        Ok(DeviceIdentity::new(id))
    }
}

/// Generate a stable hardware fingerprint for the machine
///
/// Aggregates hardware characteristics into a SHA-256 hex digest.
/// Stable across reboots and unique to the physical hardware.
///
/// Factors considered:
/// - System name
/// - CPU brand and vendor ID
/// - Number of physical cores
/// - Total memory size
pub fn hardware_fingerprint() -> String {
    let mut hasher = Sha256::new();

    // System name (e.g., "Darwin", "Linux", "Windows")
    if let Some(name) = System::name() {
        hasher.update(name.as_bytes());
        hasher.update(b"|");
    }

    let refresh_kind = RefreshKind::nothing()
        .with_cpu(CpuRefreshKind::everything())
        .with_memory(MemoryRefreshKind::everything());
    let sys = System::new_with_specifics(refresh_kind);

    // Use first CPU as representative
    if let Some(cpu) = sys.cpus().first() {
        hasher.update(cpu.brand().as_bytes());
        hasher.update(b"|");
        hasher.update(cpu.vendor_id().as_bytes());
        hasher.update(b"|");
    }

    // Physical cores are more stable than thread count
    let physical_cores = System::physical_core_count().unwrap_or(sys.cpus().len());
    hasher.update(physical_cores.to_string().as_bytes());
    hasher.update(b"|");

    hasher.update(sys.total_memory().to_string().as_bytes());

    hex::encode(hasher.finalize())
}
