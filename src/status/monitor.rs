// ABOUTME: Entry point for a deploy step: filters already-checked resources and runs the check.
// ABOUTME: Acquires the shared kubectl client lazily and prints the header and footer lines.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use super::aggregate::AggregateResult;
use super::cancel::CancelToken;
use super::client::{ClientError, ClusterHandle};
use super::orchestrator::{CheckOrchestrator, CheckSettings, Target};
use super::probe::{KubectlProbe, RolloutProbe};
use super::reporter::Reporter;
use super::resource::ResourceGroup;

pub const HEADER: &str = "Waiting for deployments to stabilize...";

enum ProbeSource {
    Cluster {
        handle: Arc<ClusterHandle>,
        timeout: Duration,
    },
    Fixed(Arc<dyn RolloutProbe>),
}

/// Runs status checks across deploy iterations, skipping resources it has
/// already checked until [`StatusMonitor::reset`] is called.
pub struct StatusMonitor {
    source: ProbeSource,
    settings: CheckSettings,
    reporter: Reporter,
    seen: Mutex<ResourceGroup>,
}

impl StatusMonitor {
    pub fn kubectl(
        handle: Arc<ClusterHandle>,
        probe_timeout: Duration,
        settings: CheckSettings,
        reporter: Reporter,
    ) -> Self {
        Self::from_source(
            ProbeSource::Cluster {
                handle,
                timeout: probe_timeout,
            },
            settings,
            reporter,
        )
    }

    pub fn with_probe(probe: Arc<dyn RolloutProbe>, settings: CheckSettings, reporter: Reporter) -> Self {
        Self::from_source(ProbeSource::Fixed(probe), settings, reporter)
    }

    fn from_source(source: ProbeSource, settings: CheckSettings, reporter: Reporter) -> Self {
        Self {
            source,
            settings,
            reporter,
            seen: Mutex::new(ResourceGroup::default()),
        }
    }

    /// Check every target not already checked since the last reset.
    /// Targets are only remembered once a probe is available to check them.
    pub async fn check(&self, targets: Vec<Target>, cancel: CancelToken) -> Result<AggregateResult, ClientError> {
        let targets = self.unseen(targets);
        if targets.is_empty() {
            tracing::debug!("no new resources to check");
            return Ok(AggregateResult::empty());
        }

        let probe: Arc<dyn RolloutProbe> = match &self.source {
            ProbeSource::Cluster { handle, timeout } => {
                let client = handle.acquire().await?;
                Arc::new(KubectlProbe::new(client, *timeout))
            }
            ProbeSource::Fixed(probe) => Arc::clone(probe),
        };
        self.remember(&targets);

        self.reporter.message(HEADER);
        let result = CheckOrchestrator::new(probe, self.settings.clone(), self.reporter.clone())
            .run(targets, cancel)
            .await;

        if result.success() {
            self.reporter.message(format!(
                "Deployments stabilized in {:.1}s",
                result.elapsed().as_secs_f64()
            ));
        }
        Ok(result)
    }

    /// Forget which resources were checked.
    pub fn reset(&self) {
        self.seen.lock().reset();
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Release the shared client, if one was acquired.
    pub async fn release(&self) {
        if let ProbeSource::Cluster { handle, .. } = &self.source {
            handle.release().await;
        }
    }

    /// Targets not yet checked, in input order, without duplicates.
    fn unseen(&self, targets: Vec<Target>) -> Vec<Target> {
        let seen = self.seen.lock();
        let mut batch = ResourceGroup::default();
        targets
            .into_iter()
            .filter(|t| {
                let fresh = !seen.contains(&t.id) && batch.add(&t.id);
                if !fresh {
                    tracing::debug!(resource = %t.id, "already checked, skipping");
                }
                fresh
            })
            .collect()
    }

    fn remember(&self, targets: &[Target]) {
        let mut seen = self.seen.lock();
        for target in targets {
            seen.add(&target.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::probe::ProbeResult;
    use crate::status::reporter::{BufferSink, ReportFormat};
    use crate::types::ResourceId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ready(AtomicUsize);

    #[async_trait]
    impl RolloutProbe for Ready {
        async fn probe(&self, _id: &ResourceId) -> ProbeResult {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("deployment \"web\" successfully rolled out".to_string())
        }
    }

    fn web() -> Target {
        Target::new(ResourceId::deployment("default", "web").unwrap())
    }

    #[tokio::test]
    async fn prints_header_and_footer() {
        let sink = BufferSink::new();
        let monitor = StatusMonitor::with_probe(
            Arc::new(Ready(AtomicUsize::new(0))),
            CheckSettings::default(),
            Reporter::new(sink.clone(), ReportFormat::Text),
        );

        let result = monitor.check(vec![web()], CancelToken::never()).await.unwrap();
        assert!(result.success());

        let lines = sink.lines();
        assert_eq!(lines.first().map(String::as_str), Some(HEADER));
        assert!(lines.last().unwrap().starts_with("Deployments stabilized in "));
    }

    #[tokio::test]
    async fn skips_resources_already_checked() {
        let probe = Arc::new(Ready(AtomicUsize::new(0)));
        let monitor = StatusMonitor::with_probe(
            probe.clone(),
            CheckSettings::default(),
            Reporter::new(BufferSink::new(), ReportFormat::Text),
        );

        monitor.check(vec![web()], CancelToken::never()).await.unwrap();
        let again = monitor.check(vec![web()], CancelToken::never()).await.unwrap();

        assert_eq!(again.total(), 0);
        assert_eq!(probe.0.load(Ordering::SeqCst), 1);

        monitor.reset();
        monitor.check(vec![web()], CancelToken::never()).await.unwrap();
        assert_eq!(probe.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_client_acquire_does_not_mark_resources_checked() {
        let handle = Arc::new(ClusterHandle::new("/nonexistent/kubectl", None));
        let monitor = StatusMonitor::kubectl(
            handle,
            Duration::from_millis(500),
            CheckSettings::default(),
            Reporter::new(BufferSink::new(), ReportFormat::Text),
        );

        assert!(monitor.check(vec![web()], CancelToken::never()).await.is_err());
        assert_eq!(monitor.seen_count(), 0);

        let again = monitor.check(vec![web()], CancelToken::never()).await;
        assert!(again.is_err(), "resource must not be skipped after a failed acquire");
    }

    #[tokio::test]
    async fn duplicate_targets_in_one_call_run_once() {
        let probe = Arc::new(Ready(AtomicUsize::new(0)));
        let monitor = StatusMonitor::with_probe(
            probe.clone(),
            CheckSettings::default(),
            Reporter::new(BufferSink::new(), ReportFormat::Text),
        );

        let result = monitor
            .check(vec![web(), web()], CancelToken::never())
            .await
            .unwrap();
        assert_eq!(result.total(), 1);
        assert_eq!(probe.0.load(Ordering::SeqCst), 1);
    }
}
