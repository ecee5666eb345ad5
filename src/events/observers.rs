use super::{ClientEvent, EventDetail, EventKind, EventObserver};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// In-memory observer for testing and diagnostics. Oldest events are dropped past `max`.
pub struct RecordingObserver {
    events: Arc<RwLock<Vec<ClientEvent>>>,
    max_events: usize,
}

impl RecordingObserver {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max,
        }
    }
    pub fn events(&self) -> Vec<ClientEvent> {
        self.events.read().unwrap_or_else(|p| p.into_inner()).clone()
    }
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
    pub fn events_for_call(&self, call_id: u64) -> Vec<ClientEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.call_id == call_id)
            .collect()
    }
    pub fn clear(&self) {
        self.events.write().unwrap_or_else(|p| p.into_inner()).clear();
    }
    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(|p| p.into_inner()).len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventObserver for RecordingObserver {
    fn on_event(&self, event: &ClientEvent) {
        let mut events = self.events.write().unwrap_or_else(|p| p.into_inner());
        events.push(event.clone());
        if events.len() > self.max_events {
            events.remove(0);
        }
    }
}

/// Forwards lifecycle events into the application's `tracing` pipeline.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl EventObserver for TracingObserver {
    fn on_event(&self, event: &ClientEvent) {
        match &event.detail {
            EventDetail::Error {
                kind,
                message,
                status,
            } => warn!(
                event = event.kind.name(),
                call_id = event.call_id,
                operation = event.operation,
                error_kind = *kind,
                http_status = *status,
                "{}",
                message
            ),
            EventDetail::Job {
                job_id,
                status,
                progress,
            } => info!(
                event = event.kind.name(),
                call_id = event.call_id,
                job_id = job_id.as_str(),
                status = *status,
                progress = *progress,
                "job update"
            ),
            EventDetail::Upload { percent, .. } => debug!(
                event = event.kind.name(),
                call_id = event.call_id,
                operation = event.operation,
                percent = *percent,
                "upload progress"
            ),
            EventDetail::None => debug!(
                event = event.kind.name(),
                call_id = event.call_id,
                operation = event.operation,
                method = event.method,
                path = event.path.as_str(),
                "voiceclone request event"
            ),
        }
    }
}
