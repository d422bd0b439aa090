// ABOUTME: A monitored workload: immutable identity plus its mutable status.
// ABOUTME: The owning poller is the only writer; reporter and orchestrator read snapshots.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use super::classify::Outcome;
use super::status::Status;
use crate::types::ResourceId;

#[derive(Debug)]
pub struct MonitoredResource {
    id: ResourceId,
    deadline: Duration,
    status: Mutex<Status>,
}

/// Result of applying an outcome to a resource.
#[derive(Debug, Clone, Default)]
pub struct Applied {
    /// Snapshot taken when the visible status changed.
    pub changed: Option<Status>,
    /// True only for the call that moved the resource into a terminal state.
    pub completed: bool,
}

impl MonitoredResource {
    pub fn new(id: ResourceId, deadline: Duration) -> Self {
        Self {
            id,
            deadline,
            status: Mutex::new(Status::new()),
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> Status {
        self.status.lock().clone()
    }

    pub fn is_complete(&self) -> bool {
        self.status.lock().completed()
    }

    /// Apply a classified probe outcome. Outcomes arriving after completion are ignored.
    pub fn apply(&self, outcome: &Outcome) -> Applied {
        let mut status = self.status.lock();
        if status.completed() {
            return Applied::default();
        }

        let changed = status.update(
            outcome.message.as_str(),
            outcome.reason.as_str(),
            outcome.err.clone(),
        );
        let completed = outcome.state.is_terminal();
        if completed {
            status.mark_complete();
        }

        Applied {
            changed: changed.then(|| status.clone()),
            completed,
        }
    }

    /// Clear the change flag once the change at `revision` has been reported.
    pub fn acknowledge(&self, revision: u64) {
        self.status.lock().acknowledge(revision);
    }
}

impl fmt::Display for MonitoredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Set of resource identities already checked.
#[derive(Debug, Default)]
pub struct ResourceGroup {
    seen: HashSet<ResourceId>,
}

impl ResourceGroup {
    /// Record `id`, returning false if it was already present.
    pub fn add(&mut self, id: &ResourceId) -> bool {
        self.seen.insert(id.clone())
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }
}
