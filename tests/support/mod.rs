// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and fake kubectl scripts for integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("rollcheck=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Write an executable shell script named `kubectl` into `dir`.
#[allow(dead_code)]
pub fn fake_kubectl(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("kubectl");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A fake kubectl that reports pending `pending_polls` times before succeeding.
/// Every invocation's arguments are appended to `<dir>/calls`.
#[allow(dead_code)]
pub fn converging_kubectl(dir: &Path, pending_polls: u32) -> PathBuf {
    let counter = dir.join("count");
    let calls = dir.join("calls");
    fake_kubectl(
        dir,
        &format!(
            r#"echo "$*" >> "{calls}"
n=$(cat "{counter}" 2>/dev/null || echo 0)
n=$((n+1))
echo $n > "{counter}"
if [ "$n" -le {pending_polls} ]; then
  echo "Waiting for deployment \"web\" rollout to finish: $n of 2 updated replicas are available..."
else
  echo "deployment \"web\" successfully rolled out"
fi"#,
            calls = calls.display(),
            counter = counter.display(),
        ),
    )
}
