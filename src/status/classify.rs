// ABOUTME: Maps free-form kubectl rollout output onto the check error taxonomy.
// ABOUTME: Pure functions only, so CLI text changes stay confined to this file.

use super::error::CheckError;
use super::probe::ProbeResult;

const ROLLOUT_SUCCESS: &str = "successfully rolled out";
const STATEFULSET_SUCCESS: [&str; 2] = ["roll out complete", "rolling update complete"];
const CONNECTION_MARKER: &str = "Unable to connect to the server";
const KILLED_MARKERS: [&str; 2] = ["signal: killed", "Killed: 9"];
const THROTTLED_MARKER: &str = "due to client-side throttling";
const NOT_FOUND_MARKER: &str = "the server could not find the requested resource";
const STRATEGY_NOT_SUPPORTED: &str =
    "rollout status is only available for RollingUpdate strategy type";

pub const MSG_CONNECTION: &str = "kubectl connection error";
pub const REASON_CONNECTION: &str = "Connection";
pub const REASON_KILLED: &str = "Killed";

/// Where a single probe leaves the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending,
    RetryableError,
    FatalError,
    Succeeded,
    Cancelled,
}

impl PollState {
    /// Terminal for the resource, not just for the probe.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::FatalError | PollState::Succeeded | PollState::Cancelled
        )
    }
}

/// Classified result of one probe, ready to apply to a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub reason: String,
    pub err: Option<CheckError>,
    pub state: PollState,
}

impl Outcome {
    fn succeeded(text: &str) -> Self {
        Self {
            message: text.to_string(),
            reason: text.to_string(),
            err: None,
            state: PollState::Succeeded,
        }
    }

    fn pending(text: &str) -> Self {
        Self {
            message: text.to_string(),
            reason: text.to_string(),
            err: None,
            state: PollState::Pending,
        }
    }

    fn fatal(reason: &str, err: CheckError) -> Self {
        Self {
            message: err.to_string(),
            reason: reason.to_string(),
            err: Some(err),
            state: PollState::FatalError,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    /// Downgrade unrecognised failures to pending instead of failing the resource.
    pub tolerate_failures: bool,
}

/// Classify one probe result.
pub fn classify(result: &ProbeResult, options: ClassifyOptions) -> Outcome {
    match result {
        Ok(output) => classify_output(output),
        Err(failure) => classify_failure(&failure.message, options),
    }
}

fn classify_output(output: &str) -> Outcome {
    let text = output.trim_end_matches(['\n', '\r']);
    if text.contains(ROLLOUT_SUCCESS) || STATEFULSET_SUCCESS.iter().any(|m| text.contains(m)) {
        Outcome::succeeded(text)
    } else {
        Outcome::pending(text)
    }
}

fn classify_failure(message: &str, options: ClassifyOptions) -> Outcome {
    let text = message.trim();

    if KILLED_MARKERS.iter().any(|m| text.contains(m)) {
        return Outcome::fatal(REASON_KILLED, CheckError::Killed);
    }

    if options.tolerate_failures {
        tracing::debug!("rollout probe failed but failures are tolerated: {}", text);
        return Outcome::pending(text);
    }

    if text.contains(THROTTLED_MARKER) || text.contains(NOT_FOUND_MARKER) {
        tracing::debug!("rollout probe hit a transient server error: {}", text);
        return Outcome::pending(text);
    }

    if text.contains(CONNECTION_MARKER) {
        return Outcome {
            message: MSG_CONNECTION.to_string(),
            reason: REASON_CONNECTION.to_string(),
            err: Some(CheckError::Connection),
            state: PollState::RetryableError,
        };
    }

    // OnDelete stateful sets have nothing to watch.
    if text.contains(STRATEGY_NOT_SUPPORTED) {
        return Outcome::succeeded(text);
    }

    Outcome::fatal(text, CheckError::Failed(text.to_string()))
}
