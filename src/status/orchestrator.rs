// ABOUTME: Runs one poller per resource concurrently under a probe concurrency cap.
// ABOUTME: Waits for every resource to finish and computes the aggregate verdict.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

use super::aggregate::AggregateResult;
use super::cancel::{CancelToken, cancel_pair};
use super::classify::{Outcome, PollState};
use super::deadline::{DeadlineManager, DeadlinePolicy};
use super::error::CheckError;
use super::poller::{PollSettings, RolloutPoller};
use super::probe::RolloutProbe;
use super::reporter::{ReportEvent, Reporter};
use super::resource::MonitoredResource;
use crate::types::ResourceId;

/// A resource handed over by the deploy step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: ResourceId,
    /// Overrides the per-kind and global defaults when set.
    pub deadline: Option<Duration>,
}

impl Target {
    pub fn new(id: ResourceId) -> Self {
        Self { id, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub poll: PollSettings,
    pub max_concurrent_probes: usize,
    /// Cancel the remaining resources once one fails.
    pub fail_fast: bool,
    pub deadlines: DeadlinePolicy,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            max_concurrent_probes: 4,
            fail_fast: false,
            deadlines: DeadlinePolicy::new(Duration::from_secs(600)),
        }
    }
}

pub struct CheckOrchestrator {
    probe: Arc<dyn RolloutProbe>,
    settings: CheckSettings,
    reporter: Reporter,
}

impl CheckOrchestrator {
    pub fn new(probe: Arc<dyn RolloutProbe>, settings: CheckSettings, reporter: Reporter) -> Self {
        Self {
            probe,
            settings,
            reporter,
        }
    }

    /// Monitor every target until it is terminal and return the verdict.
    pub async fn run(&self, targets: Vec<Target>, cancel: CancelToken) -> AggregateResult {
        let resources: Vec<Arc<MonitoredResource>> = targets
            .into_iter()
            .map(|t| {
                let deadline = self.settings.deadlines.resolve(t.id.kind(), t.deadline);
                Arc::new(MonitoredResource::new(t.id, deadline))
            })
            .collect();

        if resources.is_empty() {
            return AggregateResult::empty();
        }

        let deadlines = DeadlineManager::new(resources.iter().map(|r| r.deadline()));
        let total = resources.len();
        tracing::info!(
            resources = total,
            ceiling = ?deadlines.global().duration(),
            "starting status check"
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let reporter = tokio::spawn(self.reporter.clone().run(events_rx));

        // External cancellation and fail-fast share one stop signal.
        let (stop, stop_token) = cancel_pair();
        let forward = {
            let stop = stop.clone();
            let mut cancel = cancel;
            tokio::spawn(async move {
                cancel.cancelled().await;
                tracing::info!("status check cancelled by caller");
                stop.cancel();
            })
        };

        let limiter = Arc::new(Semaphore::new(self.settings.max_concurrent_probes.max(1)));
        let pending = Arc::new(AtomicUsize::new(total));

        let tasks: Vec<_> = resources
            .iter()
            .map(|resource| {
                let poller = RolloutPoller::new(
                    Arc::clone(resource),
                    Arc::clone(&self.probe),
                    Arc::clone(&limiter),
                    events_tx.clone(),
                    self.settings.poll,
                );
                let deadline = deadlines.for_resource(resource.deadline());
                let global = deadlines.global();
                let token = stop_token.clone();
                let stop = stop.clone();
                let events = events_tx.clone();
                let pending = Arc::clone(&pending);
                let fail_fast = self.settings.fail_fast;

                tokio::spawn(async move {
                    let state = poller.run(deadline, global, token).await;
                    let left = pending.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
                    let resource = Arc::clone(poller.resource());
                    let status = resource.status();
                    let _ = events.send(ReportEvent::Finished {
                        resource,
                        status,
                        pending: left,
                        total,
                    });
                    if fail_fast && state == PollState::FatalError {
                        stop.cancel();
                    }
                    state
                })
            })
            .collect();
        drop(events_tx);

        let results = futures::future::join_all(tasks).await;
        forward.abort();

        // Every sender is gone once the tasks end, so the reporter drains and exits.
        if reporter.await.is_err() {
            tracing::warn!("status reporter stopped unexpectedly");
        }

        for (resource, result) in resources.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(resource = %resource.id(), "status check task failed: {}", e);
                self.abort(resource, &e.to_string(), &pending, total);
            }
        }

        let result = AggregateResult::from_resources(&resources, deadlines.elapsed());
        tracing::info!(
            success = result.success(),
            failed = result.failed_count(),
            "status check finished"
        );
        result
    }

    /// Fail a resource whose poller never returned, and report it like any
    /// other terminal transition.
    fn abort(&self, resource: &Arc<MonitoredResource>, cause: &str, pending: &AtomicUsize, total: usize) {
        let err = CheckError::Failed(format!("status check aborted: {cause}"));
        let applied = resource.apply(&Outcome {
            message: err.to_string(),
            reason: err.to_string(),
            err: Some(err),
            state: PollState::FatalError,
        });
        if let Some(status) = applied.changed {
            self.reporter.write_event(&ReportEvent::Changed {
                resource: Arc::clone(resource),
                status,
            });
        }
        if applied.completed {
            let left = pending.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            self.reporter.write_event(&ReportEvent::Finished {
                resource: Arc::clone(resource),
                status: resource.status(),
                pending: left,
                total,
            });
        }
    }
}
