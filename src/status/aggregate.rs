// ABOUTME: Single verdict computed from every monitored resource's final status.
// ABOUTME: Picks the first failure in input order as the representative error.

use std::time::Duration;

use super::error::CheckError;
use super::resource::MonitoredResource;
use super::status::{Status, StatusCode};
use crate::types::ResourceId;

/// Final status of one resource.
#[derive(Debug, Clone)]
pub struct ResourceOutcome {
    pub id: ResourceId,
    pub status: Status,
}

/// The failure reported for the whole check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFailure {
    pub id: ResourceId,
    pub error: CheckError,
}

/// Aggregate failure surfaced to callers.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{failed}/{total} deployment(s) failed: {resource}: {error}")]
pub struct StatusCheckFailed {
    pub failed: usize,
    pub total: usize,
    pub resource: ResourceId,
    pub error: CheckError,
}

#[derive(Debug, Clone)]
pub struct AggregateResult {
    outcomes: Vec<ResourceOutcome>,
    success: bool,
    first_error: Option<FirstFailure>,
    elapsed: Duration,
}

impl AggregateResult {
    /// Verdict for a check that had nothing to monitor.
    pub fn empty() -> Self {
        Self::from_outcomes(Vec::new(), Duration::ZERO)
    }

    pub fn from_resources(resources: &[std::sync::Arc<MonitoredResource>], elapsed: Duration) -> Self {
        let outcomes = resources
            .iter()
            .map(|r| ResourceOutcome {
                id: r.id().clone(),
                status: r.status(),
            })
            .collect();
        Self::from_outcomes(outcomes, elapsed)
    }

    pub fn from_outcomes(outcomes: Vec<ResourceOutcome>, elapsed: Duration) -> Self {
        let success = outcomes.iter().all(|o| o.status.succeeded());

        let failures: Vec<FirstFailure> = outcomes
            .iter()
            .filter(|o| !o.status.succeeded())
            .map(|o| FirstFailure {
                id: o.id.clone(),
                error: o
                    .status
                    .error()
                    .cloned()
                    .unwrap_or_else(|| CheckError::Failed("status check did not complete".to_string())),
            })
            .collect();

        // Cancelled siblings are only representative when nothing else failed.
        let first_error = failures
            .iter()
            .find(|f| f.error.code() != StatusCode::Cancelled)
            .or_else(|| failures.first())
            .cloned();

        Self {
            outcomes,
            success,
            first_error,
            elapsed,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn outcomes(&self) -> &[ResourceOutcome] {
        &self.outcomes
    }

    pub fn first_error(&self) -> Option<&FirstFailure> {
        self.first_error.as_ref()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.status.succeeded())
            .count()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// True when the verdict came from an external or fail-fast cancellation.
    pub fn cancelled(&self) -> bool {
        self.first_error
            .as_ref()
            .is_some_and(|f| f.error.code() == StatusCode::Cancelled)
    }

    pub fn into_result(self) -> Result<Self, StatusCheckFailed> {
        match (&self.first_error, self.success) {
            (Some(first), false) => Err(StatusCheckFailed {
                failed: self.failed_count(),
                total: self.total(),
                resource: first.id.clone(),
                error: first.error.clone(),
            }),
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, err: Option<CheckError>) -> ResourceOutcome {
        let mut status = Status::new();
        if let Some(e) = &err {
            status.update(e.to_string(), e.to_string(), Some(e.clone()));
        } else {
            status.update("successfully rolled out", "successfully rolled out", None);
        }
        status.mark_complete();
        ResourceOutcome {
            id: ResourceId::deployment("default", name).unwrap(),
            status,
        }
    }

    #[test]
    fn all_succeeded() {
        let result = AggregateResult::from_outcomes(
            vec![outcome("a", None), outcome("b", None)],
            Duration::ZERO,
        );
        assert!(result.success());
        assert!(result.first_error().is_none());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn first_failure_follows_input_order() {
        let result = AggregateResult::from_outcomes(
            vec![
                outcome("a", None),
                outcome("b", Some(CheckError::Failed("b broke".into()))),
                outcome("c", Some(CheckError::Killed)),
            ],
            Duration::ZERO,
        );
        assert!(!result.success());
        assert_eq!(result.failed_count(), 2);
        let first = result.first_error().unwrap();
        assert_eq!(first.id.name().as_str(), "b");

        let err = result.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "2/3 deployment(s) failed: default/deployment/b: b broke"
        );
    }

    #[test]
    fn cancelled_siblings_are_not_representative() {
        let result = AggregateResult::from_outcomes(
            vec![
                outcome("a", Some(CheckError::Cancelled)),
                outcome("b", Some(CheckError::Killed)),
            ],
            Duration::ZERO,
        );
        assert_eq!(result.first_error().unwrap().error, CheckError::Killed);
        assert!(!result.cancelled());
    }

    #[test]
    fn all_cancelled_is_reported_as_cancelled() {
        let result = AggregateResult::from_outcomes(
            vec![outcome("a", Some(CheckError::Cancelled))],
            Duration::ZERO,
        );
        assert!(!result.success());
        assert!(result.cancelled());
    }

    #[test]
    fn incomplete_resource_is_a_failure() {
        let pending = ResourceOutcome {
            id: ResourceId::deployment("default", "a").unwrap(),
            status: Status::new(),
        };
        let result = AggregateResult::from_outcomes(vec![pending], Duration::ZERO);
        assert!(!result.success());
        assert!(result.first_error().is_some());
    }

    #[test]
    fn empty_check_succeeds() {
        assert!(AggregateResult::empty().success());
    }
}
