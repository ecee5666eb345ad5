//! 事件总线：请求生命周期通知（开始、缓存命中、成功、失败、结束）。
//!
//! Lifecycle events.
//!
//! Events are observational only. Nothing in the client reads them back, and
//! an observer can neither alter nor block control flow. The order in which
//! several observers receive one event is unspecified.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`EventBus`] | Observer list with subscribe / unsubscribe |
//! | [`EventObserver`] | Observer trait, implemented for closures |
//! | [`RecordingObserver`] | Keeps events in memory |
//! | [`TracingObserver`] | Forwards events to `tracing` |

mod observers;

pub use observers::{RecordingObserver, TracingObserver};

use crate::transport::{Endpoint, ProgressCallback, UploadProgress};
use crate::Error;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    RequestStart,
    CacheHit,
    RequestSuccess,
    RequestError,
    RequestEnd,
    JobUpdate,
    UploadProgress,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::RequestStart => "requestStart",
            EventKind::CacheHit => "cacheHit",
            EventKind::RequestSuccess => "requestSuccess",
            EventKind::RequestError => "requestError",
            EventKind::RequestEnd => "requestEnd",
            EventKind::JobUpdate => "jobUpdate",
            EventKind::UploadProgress => "uploadProgress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetail {
    None,
    Error {
        kind: &'static str,
        message: String,
        status: Option<u16>,
    },
    Job {
        job_id: String,
        status: &'static str,
        progress: Option<u8>,
    },
    Upload {
        sent: u64,
        total: u64,
        percent: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientEvent {
    pub kind: EventKind,
    /// Correlates all events of one client call.
    pub call_id: u64,
    pub operation: &'static str,
    pub method: &'static str,
    pub path: String,
    pub timestamp: f64,
    pub detail: EventDetail,
}

pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &ClientEvent);
}

impl<F> EventObserver for F
where
    F: Fn(&ClientEvent) + Send + Sync,
{
    fn on_event(&self, event: &ClientEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn EventObserver>)>>,
    next_subscription: AtomicU64,
    next_call: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push((id, observer));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(|p| p.into_inner());
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn publish(&self, event: &ClientEvent) {
        // Snapshot so observers may (un)subscribe from inside a callback.
        let observers: Vec<Arc<dyn EventObserver>> = self
            .observers
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer.on_event(event);
        }
    }

    /// Open a call scope and emit `requestStart`. `requestEnd` fires when the scope drops.
    pub fn begin(self: &Arc<Self>, endpoint: &Endpoint) -> RequestScope {
        self.begin_as(endpoint.operation(), endpoint)
    }

    /// Like [`begin`](Self::begin) with an explicit operation name.
    pub fn begin_as(self: &Arc<Self>, operation: &'static str, endpoint: &Endpoint) -> RequestScope {
        let scope = RequestScope {
            bus: Arc::clone(self),
            call: CallInfo {
                call_id: self.next_call.fetch_add(1, Ordering::Relaxed),
                operation,
                method: endpoint.method().as_str(),
                path: endpoint.path(),
            },
            settled: false,
        };
        scope.emit(EventKind::RequestStart, EventDetail::None);
        scope
    }

    fn emit(&self, call: &CallInfo, kind: EventKind, detail: EventDetail) {
        self.publish(&ClientEvent {
            kind,
            call_id: call.call_id,
            operation: call.operation,
            method: call.method,
            path: call.path.clone(),
            timestamp: timestamp(),
            detail,
        });
    }
}

#[derive(Debug, Clone)]
struct CallInfo {
    call_id: u64,
    operation: &'static str,
    method: &'static str,
    path: String,
}

/// One client call's lifecycle.
///
/// At most one of `requestSuccess` / `requestError` is emitted. `requestEnd`
/// is emitted from `Drop`, including when the calling future is abandoned.
pub struct RequestScope {
    bus: Arc<EventBus>,
    call: CallInfo,
    settled: bool,
}

impl RequestScope {
    pub fn call_id(&self) -> u64 {
        self.call.call_id
    }

    fn emit(&self, kind: EventKind, detail: EventDetail) {
        self.bus.emit(&self.call, kind, detail);
    }

    pub fn cache_hit(&self) {
        self.emit(EventKind::CacheHit, EventDetail::None);
    }

    pub fn job_update(&self, job: &crate::jobs::Job) {
        self.emit(
            EventKind::JobUpdate,
            EventDetail::Job {
                job_id: job.id.clone(),
                status: job.status.as_str(),
                progress: job.progress,
            },
        );
    }

    pub fn upload_progress(&self, progress: UploadProgress) {
        self.emit(EventKind::UploadProgress, upload_detail(progress));
    }

    /// A progress callback that publishes `uploadProgress` for this call,
    /// then forwards to `forward` if given.
    pub fn progress_reporter(&self, forward: Option<ProgressCallback>) -> ProgressCallback {
        let bus = Arc::clone(&self.bus);
        let call = self.call.clone();
        Arc::new(move |progress: UploadProgress| {
            bus.emit(&call, EventKind::UploadProgress, upload_detail(progress));
            if let Some(forward) = &forward {
                forward(progress);
            }
        })
    }

    /// Emit the outcome of the call. Only the first settlement is published.
    pub fn settle<T>(&mut self, outcome: &crate::Result<T>) {
        if self.settled {
            return;
        }
        self.settled = true;
        match outcome {
            Ok(_) => self.emit(EventKind::RequestSuccess, EventDetail::None),
            Err(e) => self.emit(EventKind::RequestError, error_detail(e)),
        }
    }

    /// Settle with `outcome` and hand it back; the scope ends here.
    pub fn finish<T>(mut self, outcome: crate::Result<T>) -> crate::Result<T> {
        self.settle(&outcome);
        outcome
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.emit(EventKind::RequestEnd, EventDetail::None);
    }
}

fn upload_detail(progress: UploadProgress) -> EventDetail {
    EventDetail::Upload {
        sent: progress.sent,
        total: progress.total,
        percent: progress.percent,
    }
}

fn error_detail(error: &Error) -> EventDetail {
    EventDetail::Error {
        kind: error.kind().as_str(),
        message: error.to_string(),
        status: error.status(),
    }
}
