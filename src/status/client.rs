// ABOUTME: Lazily acquired kubectl client shared by all probes in a check.
// ABOUTME: Resolves the kube context once and memoises it until released.

use snafu::{ResultExt, Snafu};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;

const CONTEXT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientError {
    #[snafu(display("failed to run {binary}: {source}"))]
    Spawn {
        binary: String,
        source: std::io::Error,
    },

    #[snafu(display("no current kube context: {stderr}"))]
    NoContext { stderr: String },

    #[snafu(display("timed out resolving kube context after {timeout:?}"))]
    LookupTimeout { timeout: Duration },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// The kubectl binary could not be started.
    BinaryUnavailable,
    /// kubectl ran but has no usable context.
    NoContext,
    /// Context lookup hung.
    Timeout,
}

impl ClientError {
    pub fn kind(&self) -> ClientErrorKind {
        match self {
            ClientError::Spawn { .. } => ClientErrorKind::BinaryUnavailable,
            ClientError::NoContext { .. } => ClientErrorKind::NoContext,
            ClientError::LookupTimeout { .. } => ClientErrorKind::Timeout,
        }
    }
}

/// A resolved kubectl invocation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubectlClient {
    binary: String,
    context: Option<String>,
}

impl KubectlClient {
    pub fn new(binary: impl Into<String>, context: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            context,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Arguments prefixed to every kubectl command.
    pub fn base_args(&self) -> Vec<String> {
        match &self.context {
            Some(ctx) => vec!["--context".to_string(), ctx.clone()],
            None => Vec::new(),
        }
    }
}

/// Owns the lifecycle of the shared client.
#[derive(Debug)]
pub struct ClusterHandle {
    binary: String,
    context: Option<String>,
    client: Mutex<Option<Arc<KubectlClient>>>,
}

impl ClusterHandle {
    pub fn new(binary: impl Into<String>, context: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            context,
            client: Mutex::new(None),
        }
    }

    /// Return the shared client, resolving the current context on first use.
    pub async fn acquire(&self) -> Result<Arc<KubectlClient>, ClientError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let context = match &self.context {
            Some(ctx) => ctx.clone(),
            None => self.current_context().await?,
        };
        tracing::debug!("using kube context {}", context);

        let client = Arc::new(KubectlClient::new(self.binary.clone(), Some(context)));
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the memoised client. The next acquire resolves it again.
    pub async fn release(&self) {
        self.client.lock().await.take();
    }

    pub async fn is_acquired(&self) -> bool {
        self.client.lock().await.is_some()
    }

    async fn current_context(&self) -> Result<String, ClientError> {
        let lookup = Command::new(&self.binary)
            .args(["config", "current-context"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(CONTEXT_LOOKUP_TIMEOUT, lookup)
            .await
            .map_err(|_| ClientError::LookupTimeout {
                timeout: CONTEXT_LOOKUP_TIMEOUT,
            })?
            .context(SpawnSnafu {
                binary: self.binary.clone(),
            })?;

        let context = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || context.is_empty() {
            return NoContextSnafu {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .fail();
        }
        Ok(context)
    }
}
