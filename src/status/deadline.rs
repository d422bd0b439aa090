// ABOUTME: Wall-clock cutoffs for individual resources and the whole check.
// ABOUTME: Deadlines are independent of the polling cadence.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::types::ResourceKind;

/// A single cutoff measured from a start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Instant,
    duration: Duration,
}

impl Deadline {
    pub fn new(start: Instant, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn starting_now(duration: Duration) -> Self {
        Self::new(Instant::now(), duration)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The instant at which the deadline fires.
    pub fn instant(&self) -> Instant {
        self.start + self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.instant().saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.instant()
    }
}

/// Hands out resource deadlines sharing one start instant and enforces the
/// process-wide ceiling.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineManager {
    start: Instant,
    global: Deadline,
}

impl DeadlineManager {
    /// The global ceiling is the longest of the given resource deadlines.
    pub fn new(resource_deadlines: impl IntoIterator<Item = Duration>) -> Self {
        let start = Instant::now();
        let ceiling = resource_deadlines
            .into_iter()
            .max()
            .unwrap_or(Duration::ZERO);
        Self {
            start,
            global: Deadline::new(start, ceiling),
        }
    }

    pub fn for_resource(&self, duration: Duration) -> Deadline {
        Deadline::new(self.start, duration)
    }

    pub fn global(&self) -> Deadline {
        self.global
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Chooses a deadline for each resource: explicit, then per-kind, then default.
#[derive(Debug, Clone)]
pub struct DeadlinePolicy {
    pub default: Duration,
    pub per_kind: HashMap<ResourceKind, Duration>,
}

impl DeadlinePolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            per_kind: HashMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: ResourceKind, deadline: Duration) -> Self {
        self.per_kind.insert(kind, deadline);
        self
    }

    /// Resolve the deadline for a resource. An explicit value wins unless it is zero.
    pub fn resolve(&self, kind: ResourceKind, explicit: Option<Duration>) -> Duration {
        match explicit {
            Some(d) if !d.is_zero() => d,
            _ => self.per_kind.get(&kind).copied().unwrap_or(self.default),
        }
    }
}
