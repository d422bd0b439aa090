// ABOUTME: Rollout status checking: probing, classification, deadlines, and reporting.
// ABOUTME: StatusMonitor is the entry point used by the check command.

mod aggregate;
mod cancel;
mod classify;
mod client;
mod deadline;
mod error;
mod monitor;
mod orchestrator;
mod poller;
mod probe;
mod reporter;
mod resource;
#[allow(clippy::module_inception)]
mod status;

pub use aggregate::{AggregateResult, FirstFailure, ResourceOutcome, StatusCheckFailed};
pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use classify::{ClassifyOptions, Outcome, PollState, classify};
pub use client::{ClientError, ClientErrorKind, ClusterHandle, KubectlClient};
pub use deadline::{Deadline, DeadlineManager, DeadlinePolicy};
pub use error::CheckError;
pub use monitor::{HEADER, StatusMonitor};
pub use orchestrator::{CheckOrchestrator, CheckSettings, Target};
pub use poller::{PollSettings, REASON_CANCELLED, REASON_DEADLINE, RolloutPoller};
pub use probe::{KubectlProbe, ProbeFailure, ProbeResult, RolloutProbe};
pub use reporter::{BufferSink, ReportEvent, ReportFormat, Reporter};
pub use resource::{Applied, MonitoredResource, ResourceGroup};
pub use status::{Status, StatusCode};
