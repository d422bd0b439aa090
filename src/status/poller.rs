// ABOUTME: Per-resource polling loop: probe, classify, update status, report changes.
// ABOUTME: Owns pacing, deadline enforcement, and cancellation for a single resource.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::time::{Instant, sleep, sleep_until};

use super::cancel::CancelToken;
use super::classify::{ClassifyOptions, Outcome, PollState, classify};
use super::deadline::Deadline;
use super::error::CheckError;
use super::probe::RolloutProbe;
use super::reporter::ReportEvent;
use super::resource::MonitoredResource;

pub const REASON_DEADLINE: &str = "deadline exceeded";
pub const REASON_CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub classify: ClassifyOptions,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            classify: ClassifyOptions::default(),
        }
    }
}

/// Drives one resource to a terminal state.
pub struct RolloutPoller {
    resource: Arc<MonitoredResource>,
    probe: Arc<dyn RolloutProbe>,
    limiter: Arc<Semaphore>,
    events: mpsc::UnboundedSender<ReportEvent>,
    settings: PollSettings,
}

impl RolloutPoller {
    pub fn new(
        resource: Arc<MonitoredResource>,
        probe: Arc<dyn RolloutProbe>,
        limiter: Arc<Semaphore>,
        events: mpsc::UnboundedSender<ReportEvent>,
        settings: PollSettings,
    ) -> Self {
        Self {
            resource,
            probe,
            limiter,
            events,
            settings,
        }
    }

    pub fn resource(&self) -> &Arc<MonitoredResource> {
        &self.resource
    }

    /// Run one probe and apply its classified outcome.
    pub async fn check_once(&self) -> PollState {
        let result = {
            // A closed semaphore only happens on shutdown; probe anyway.
            let _permit = self.limiter.acquire().await.ok();
            self.probe.probe(self.resource.id()).await
        };
        let outcome = classify(&result, self.settings.classify);
        tracing::debug!(
            resource = %self.resource.id(),
            state = ?outcome.state,
            "probe classified: {}",
            outcome.reason
        );
        self.record(&outcome);
        outcome.state
    }

    /// Poll until the resource is terminal, its deadline passes, or the check is cancelled.
    pub async fn run(&self, deadline: Deadline, global: Deadline, mut cancel: CancelToken) -> PollState {
        let cutoff = deadline.instant().min(global.instant());
        tracing::debug!(
            resource = %self.resource.id(),
            deadline = ?deadline.duration(),
            "checking rollout status"
        );

        loop {
            if cancel.is_cancelled() {
                return self.cancel();
            }
            if Instant::now() >= cutoff {
                return self.expire(deadline.duration());
            }

            let state = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancel(),
                _ = sleep_until(cutoff) => return self.expire(deadline.duration()),
                state = self.check_once() => state,
            };
            if state.is_terminal() {
                return state;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancel(),
                _ = sleep_until(cutoff) => {}
                _ = sleep(self.settings.interval) => {}
            }
        }
    }

    /// Force the resource into a deadline-exceeded terminal state.
    pub fn expire(&self, deadline: Duration) -> PollState {
        let last = self.resource.status().reason().to_string();
        let err = CheckError::DeadlineExceeded {
            deadline,
            last: (!last.is_empty()).then_some(last),
        };
        tracing::info!(resource = %self.resource.id(), "{}", err);
        self.record(&Outcome {
            message: err.to_string(),
            reason: REASON_DEADLINE.to_string(),
            err: Some(err),
            state: PollState::FatalError,
        });
        PollState::FatalError
    }

    /// Force the resource into the cancelled terminal state.
    pub fn cancel(&self) -> PollState {
        tracing::debug!(resource = %self.resource.id(), "status check cancelled");
        self.record(&Outcome {
            message: CheckError::Cancelled.to_string(),
            reason: REASON_CANCELLED.to_string(),
            err: Some(CheckError::Cancelled),
            state: PollState::Cancelled,
        });
        PollState::Cancelled
    }

    fn record(&self, outcome: &Outcome) {
        let applied = self.resource.apply(outcome);
        if let Some(status) = applied.changed {
            // The reporter may already be gone during shutdown.
            let _ = self.events.send(ReportEvent::Changed {
                resource: Arc::clone(&self.resource),
                status,
            });
        }
    }
}
