// ABOUTME: Writes status changes and per-resource summaries to an output sink.
// ABOUTME: Drains a channel fed by pollers so writing never blocks polling.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

use super::resource::MonitoredResource;
use super::status::{Status, StatusCode};

pub const TAB_HEADER: &str = " -";

/// Something the reporter should write.
#[derive(Debug)]
pub enum ReportEvent {
    /// A resource's visible status changed.
    Changed {
        resource: Arc<MonitoredResource>,
        status: Status,
    },
    /// A resource reached its terminal state.
    Finished {
        resource: Arc<MonitoredResource>,
        status: Status,
        pending: usize,
        total: usize,
    },
    /// Free-form progress line.
    Message(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Serialises writes from every resource onto one sink.
#[derive(Clone)]
pub struct Reporter {
    sink: Sink,
    format: ReportFormat,
    failed_writes: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("format", &self.format)
            .finish()
    }
}

impl Reporter {
    pub fn new(sink: impl Write + Send + 'static, format: ReportFormat) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
            format,
            failed_writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(io::stdout(), format)
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Number of lines that could not be written.
    pub fn failed_writes(&self) -> usize {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Drain events until every sender is dropped.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<ReportEvent>) {
        while let Some(event) = events.recv().await {
            let written = self.write_event(&event);
            if let (true, ReportEvent::Changed { resource, status }) = (written, &event) {
                resource.acknowledge(status.revision());
            }
        }
    }

    /// Write one event. Returns false if the sink rejected it.
    pub fn write_event(&self, event: &ReportEvent) -> bool {
        let Some(line) = self.render(event) else {
            return true;
        };
        let mut sink = self.sink.lock();
        match writeln!(sink, "{line}").and_then(|_| sink.flush()) {
            Ok(()) => true,
            Err(e) => {
                self.failed_writes.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("failed to write status line: {}", e);
                false
            }
        }
    }

    pub fn message(&self, text: impl Into<String>) -> bool {
        self.write_event(&ReportEvent::Message(text.into()))
    }

    fn render(&self, event: &ReportEvent) -> Option<String> {
        match self.format {
            ReportFormat::Text => render_text(event),
            ReportFormat::Json => render_json(event),
        }
    }
}

fn render_text(event: &ReportEvent) -> Option<String> {
    match event {
        ReportEvent::Changed { resource, status } => {
            Some(format!("{TAB_HEADER} {} {}", resource.id(), status))
        }
        ReportEvent::Finished {
            resource,
            status,
            pending,
            total,
        } => match status.code() {
            StatusCode::Cancelled => None,
            StatusCode::Success => Some(format!(
                "{TAB_HEADER} {} is ready.{}",
                resource.id(),
                pending_message(*pending, *total)
            )),
            _ => Some(format!("{TAB_HEADER} {} failed. Error: {}.", resource.id(), status)),
        },
        ReportEvent::Message(text) => Some(text.clone()),
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<StatusCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
    timestamp: DateTime<Utc>,
}

fn render_json(event: &ReportEvent) -> Option<String> {
    let json = match event {
        ReportEvent::Changed { resource, status } => JsonEvent {
            event: "status",
            resource: Some(resource.id().to_string()),
            status: Some(status.to_string()),
            message: None,
            code: Some(status.code()),
            completed: Some(status.completed()),
            timestamp: Utc::now(),
        },
        ReportEvent::Finished {
            resource, status, ..
        } => {
            let event = match status.code() {
                StatusCode::Cancelled => return None,
                StatusCode::Success => "ready",
                _ => "failed",
            };
            JsonEvent {
                event,
                resource: Some(resource.id().to_string()),
                status: Some(status.to_string()),
                message: None,
                code: Some(status.code()),
                completed: Some(true),
                timestamp: Utc::now(),
            }
        }
        ReportEvent::Message(text) => JsonEvent {
            event: "message",
            resource: None,
            status: None,
            message: Some(text.clone()),
            code: None,
            completed: None,
            timestamp: Utc::now(),
        },
    };
    serde_json::to_string(&json).ok()
}

fn pending_message(pending: usize, total: usize) -> String {
    if pending > 0 {
        format!(" [{pending}/{total} deployment(s) still pending]")
    } else {
        String::new()
    }
}

/// In-memory sink that can be cloned and inspected.
#[derive(Debug, Clone, Default)]
pub struct BufferSink(Arc<Mutex<Vec<u8>>>);

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for BufferSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
