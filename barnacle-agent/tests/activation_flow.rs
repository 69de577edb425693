//! Activation state machine behavior against a scripted cloud proxy.

mod common;

use std::sync::Arc;

use barnacle_agent::cloud::CloudProxy;
use barnacle_agent::services::{ActivationManager, ActivationState, IdentityResolver};

use common::{StubCloudProxy, test_config};

fn manager_with_status(
    dir: &tempfile::TempDir,
    status: i32,
) -> (ActivationManager, Arc<StubCloudProxy>) {
    let config = test_config(dir);
    let stub = Arc::new(StubCloudProxy::with_status(status));
    let cloud: Arc<dyn CloudProxy> = stub.clone();
    let manager = ActivationManager::new(IdentityResolver::new(&config), cloud);
    (manager, stub)
}

#[tokio::test]
async fn activates_when_cloud_returns_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, stub) = manager_with_status(&dir, 0);

    assert_eq!(manager.state().await, ActivationState::Idle);

    let ctx = manager.activate().await.expect("activation should succeed");
    assert_eq!(manager.state().await, ActivationState::Activated);

    // The activated context carries the resolved identity
    let activations = stub.activations.lock().await;
    assert_eq!(activations.len(), 1);
    assert_eq!(activations[0], ctx.identity.as_str());
}

#[tokio::test]
async fn fails_terminally_on_nonzero_status() {
    for status in [1, 42] {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _stub) = manager_with_status(&dir, status);

        let err = manager.activate().await.expect_err("activation must fail");
        assert_eq!(manager.state().await, ActivationState::Failed(status));

        // The cloud status code is the process exit code
        assert_eq!(err.exit_code(), status);
    }
}

#[tokio::test]
async fn activation_is_rederived_on_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, stub) = manager_with_status(&dir, 0);

    manager.activate().await.unwrap();
    manager.activate().await.unwrap();

    // Same device, same identity on both attempts
    let activations = stub.activations.lock().await;
    assert_eq!(activations.len(), 2);
    assert_eq!(activations[0], activations[1]);
}
