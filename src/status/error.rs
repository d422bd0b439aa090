// ABOUTME: Terminal and transient failure types for rollout checks.
// ABOUTME: Every failure maps to a StatusCode for programmatic handling.

use std::time::Duration;

use super::status::StatusCode;

/// Failure recorded in a resource's status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// Control plane unreachable. Retried until the deadline.
    #[error("kubectl connection error")]
    Connection,

    /// The probe process was terminated by a timeout.
    #[error("kubectl killed due to timeout")]
    Killed,

    /// Any other probe failure, surfaced verbatim.
    #[error("{0}")]
    Failed(String),

    /// Ran out of time while the rollout was still pending.
    #[error("could not stabilize within {deadline:?}: deadline exceeded{}", last_suffix(.last))]
    DeadlineExceeded {
        deadline: Duration,
        last: Option<String>,
    },

    /// Stopped by an external cancellation signal or a failing sibling.
    #[error("check cancelled")]
    Cancelled,
}

fn last_suffix(last: &Option<String>) -> String {
    match last {
        Some(reason) if !reason.is_empty() => format!(" (last status: {reason})"),
        _ => String::new(),
    }
}

impl CheckError {
    pub fn code(&self) -> StatusCode {
        match self {
            CheckError::Connection => StatusCode::Connection,
            CheckError::Killed => StatusCode::Killed,
            CheckError::Failed(_) => StatusCode::Failed,
            CheckError::DeadlineExceeded { .. } => StatusCode::DeadlineExceeded,
            CheckError::Cancelled => StatusCode::Cancelled,
        }
    }

    /// Whether another probe may still turn this into a success.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckError::Connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_message_names_last_status() {
        let err = CheckError::DeadlineExceeded {
            deadline: Duration::from_secs(2),
            last: Some("Connection".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "could not stabilize within 2s: deadline exceeded (last status: Connection)"
        );
    }

    #[test]
    fn deadline_message_without_last_status() {
        let err = CheckError::DeadlineExceeded {
            deadline: Duration::from_millis(1500),
            last: None,
        };
        assert_eq!(
            err.to_string(),
            "could not stabilize within 1.5s: deadline exceeded"
        );
    }

    #[test]
    fn only_connection_is_retryable() {
        assert!(CheckError::Connection.is_retryable());
        assert!(!CheckError::Killed.is_retryable());
        assert!(!CheckError::Failed("boom".into()).is_retryable());
        assert!(!CheckError::Cancelled.is_retryable());
    }
}
