// ABOUTME: Integration tests for the kubectl-backed probe and client acquisition.
// ABOUTME: Uses executable shell scripts in a temp dir in place of kubectl.

mod support;

use rollcheck::status::{
    ClientErrorKind, ClusterHandle, KubectlClient, KubectlProbe, ProbeFailure, RolloutProbe,
};
use rollcheck::types::ResourceId;
use std::sync::Arc;
use std::time::{Duration, Instant};
use support::fake_kubectl;
use tempfile::TempDir;

fn probe_for(binary: &std::path::Path, timeout: Duration) -> KubectlProbe {
    let client = KubectlClient::new(binary.to_string_lossy(), Some("kind-test".to_string()));
    KubectlProbe::new(Arc::new(client), timeout)
}

fn web() -> ResourceId {
    ResourceId::deployment("default", "web").unwrap()
}

#[tokio::test]
async fn success_returns_stdout() {
    support::init_tracing();
    let dir = TempDir::new().unwrap();
    let kubectl = fake_kubectl(
        dir.path(),
        "echo 'deployment \"web\" successfully rolled out'",
    );

    let out = probe_for(&kubectl, Duration::from_secs(5))
        .probe(&web())
        .await
        .unwrap();
    assert_eq!(out.trim(), "deployment \"web\" successfully rolled out");
}

#[tokio::test]
async fn passes_context_namespace_and_no_watch() {
    let dir = TempDir::new().unwrap();
    let kubectl = fake_kubectl(dir.path(), "echo \"$*\"");

    let out = probe_for(&kubectl, Duration::from_secs(5))
        .probe(&ResourceId::parse("shop/sts/db", &Default::default()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        out.trim(),
        "--context kind-test rollout status statefulset db --namespace shop --watch=false"
    );
}

#[tokio::test]
async fn failure_prefers_stderr() {
    let dir = TempDir::new().unwrap();
    let kubectl = fake_kubectl(
        dir.path(),
        "echo 'partial output'\necho 'Unable to connect to the server: dial tcp' >&2\nexit 1",
    );

    let err = probe_for(&kubectl, Duration::from_secs(5))
        .probe(&web())
        .await
        .unwrap_err();
    assert_eq!(err.message, "Unable to connect to the server: dial tcp");
}

#[tokio::test]
async fn silent_failure_reports_exit_status() {
    let dir = TempDir::new().unwrap();
    let kubectl = fake_kubectl(dir.path(), "exit 3");

    let err = probe_for(&kubectl, Duration::from_secs(5))
        .probe(&web())
        .await
        .unwrap_err();
    assert_eq!(err.message, "exit status 3");
}

#[tokio::test]
async fn hung_probe_is_killed_at_timeout() {
    let dir = TempDir::new().unwrap();
    let kubectl = fake_kubectl(dir.path(), "sleep 5");

    let started = Instant::now();
    let err = probe_for(&kubectl, Duration::from_millis(200))
        .probe(&web())
        .await
        .unwrap_err();

    assert_eq!(err, ProbeFailure::killed());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn missing_binary_is_a_probe_failure() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-kubectl");

    let err = probe_for(&missing, Duration::from_secs(1))
        .probe(&web())
        .await
        .unwrap_err();
    assert!(err.message.starts_with("failed to run"));
}

#[tokio::test]
async fn acquire_resolves_current_context() {
    let dir = TempDir::new().unwrap();
    let kubectl = fake_kubectl(
        dir.path(),
        "if [ \"$1 $2\" = \"config current-context\" ]; then echo kind-local; else exit 1; fi",
    );

    let handle = ClusterHandle::new(kubectl.to_string_lossy(), None);
    let client = handle.acquire().await.unwrap();
    assert_eq!(client.context(), Some("kind-local"));
}

#[tokio::test]
async fn acquire_without_context_fails() {
    let dir = TempDir::new().unwrap();
    let kubectl = fake_kubectl(
        dir.path(),
        "echo 'error: current-context is not set' >&2\nexit 1",
    );

    let handle = ClusterHandle::new(kubectl.to_string_lossy(), None);
    let err = handle.acquire().await.unwrap_err();
    assert_eq!(err.kind(), ClientErrorKind::NoContext);
    assert!(err.to_string().contains("current-context is not set"));
    assert!(!handle.is_acquired().await);
}
