// ABOUTME: One non-blocking rollout status query per call.
// ABOUTME: KubectlProbe shells out to `kubectl rollout status --watch=false` with a hard timeout.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use super::client::KubectlClient;
use crate::types::ResourceId;

/// Diagnostic text from a failed probe (stderr, stdout, and exit cause).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProbeFailure {
    pub message: String,
}

impl ProbeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The probe process was killed, either by us or by the OS.
    pub fn killed() -> Self {
        Self::new("signal: killed")
    }
}

/// Stdout on success, diagnostic text on failure.
pub type ProbeResult = Result<String, ProbeFailure>;

/// A single status query for one resource.
#[async_trait]
pub trait RolloutProbe: Send + Sync {
    async fn probe(&self, id: &ResourceId) -> ProbeResult;
}

/// Runs kubectl as an isolated subprocess for every probe.
#[derive(Debug, Clone)]
pub struct KubectlProbe {
    client: Arc<KubectlClient>,
    timeout: Duration,
}

impl KubectlProbe {
    pub fn new(client: Arc<KubectlClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn args(&self, id: &ResourceId) -> Vec<String> {
        let mut args = self.client.base_args();
        args.extend([
            "rollout".to_string(),
            "status".to_string(),
            id.kind().as_str().to_string(),
            id.name().to_string(),
            "--namespace".to_string(),
            id.namespace().to_string(),
            "--watch=false".to_string(),
        ]);
        args
    }
}

#[async_trait]
impl RolloutProbe for KubectlProbe {
    async fn probe(&self, id: &ResourceId) -> ProbeResult {
        let args = self.args(id);
        tracing::debug!("running {} {}", self.client.binary(), args.join(" "));

        let child = Command::new(self.client.binary())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ProbeFailure::new(format!(
                    "failed to run {}: {}",
                    self.client.binary(),
                    e
                )));
            }
            Err(_elapsed) => {
                tracing::debug!("probe for {} exceeded {:?}", id, self.timeout);
                return Err(ProbeFailure::killed());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        let cause = exit_cause(output.status);
        if message.is_empty() {
            message = cause;
        } else if cause.starts_with("signal") {
            message = format!("{message}: {cause}");
        }
        Err(ProbeFailure::new(message))
    }
}

#[cfg(unix)]
fn exit_cause(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => format!("exit status {code}"),
        (None, Some(9)) => "signal: killed".to_string(),
        (None, Some(sig)) => format!("signal: {sig}"),
        (None, None) => "terminated".to_string(),
    }
}

#[cfg(not(unix))]
fn exit_cause(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {code}"),
        None => "terminated".to_string(),
    }
}
