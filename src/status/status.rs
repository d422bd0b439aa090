// ABOUTME: Latest observed state of one monitored resource.
// ABOUTME: Tracks change detection for reporting and a monotonic completion flag.

use serde::Serialize;
use std::fmt;

use super::error::CheckError;

/// Coarse classification of a status, derived from its error and completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Pending,
    Success,
    Connection,
    Killed,
    Failed,
    DeadlineExceeded,
    Cancelled,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Pending => "PENDING",
            StatusCode::Success => "SUCCESS",
            StatusCode::Connection => "CONNECTION",
            StatusCode::Killed => "KILLED",
            StatusCode::Failed => "FAILED",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    details: String,
    reason: String,
    err: Option<CheckError>,
    changed: bool,
    completed: bool,
    revision: u64,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace details, reason and error if the candidate differs from the
    /// current value. Returns whether anything changed.
    pub fn update(
        &mut self,
        message: impl Into<String>,
        reason: impl Into<String>,
        err: Option<CheckError>,
    ) -> bool {
        let candidate = Status {
            details: trim_newlines(message.into()),
            reason: trim_newlines(reason.into()),
            err,
            ..Status::default()
        };

        if self.equivalent(&candidate) {
            return false;
        }

        self.details = candidate.details;
        self.reason = candidate.reason;
        self.err = candidate.err;
        self.changed = true;
        self.revision += 1;
        true
    }

    /// Two statuses are equivalent only when both the reason and the error
    /// message match.
    pub fn equivalent(&self, other: &Status) -> bool {
        self.reason == other.reason
            && self.err.as_ref().map(ToString::to_string)
                == other.err.as_ref().map(ToString::to_string)
    }

    /// Set the terminal flag. Never reset.
    pub fn mark_complete(&mut self) {
        self.completed = true;
    }

    /// Clear the change flag if no newer change happened since `revision`.
    pub fn acknowledge(&mut self, revision: u64) {
        if self.revision == revision {
            self.changed = false;
        }
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn error(&self) -> Option<&CheckError> {
        self.err.as_ref()
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn code(&self) -> StatusCode {
        match (&self.err, self.completed) {
            (Some(err), _) => err.code(),
            (None, true) => StatusCode::Success,
            (None, false) => StatusCode::Pending,
        }
    }

    /// Completed without error.
    pub fn succeeded(&self) -> bool {
        self.completed && self.err.is_none()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.err {
            Some(err) => write!(f, "{}", trim_newlines(err.to_string())),
            None => f.write_str(&self.details),
        }
    }
}

fn trim_newlines(mut s: String) -> String {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
    s
}
