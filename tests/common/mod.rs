//! Shared test doubles for client integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use voiceclone_client::events::RecordingObserver;
use voiceclone_client::transport::{
    BinaryBody, Endpoint, HttpMethod, Payload, RequestBody, Transport, TransportError,
    TransportRequest, UploadProgress,
};
use voiceclone_client::{ClientConfig, Error, Result, VoiceClient};

/// One scripted response.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Binary {
        content_type: &'static str,
        file_name: Option<&'static str>,
        data: &'static [u8],
    },
    Text(&'static str),
    Status(u16, Value),
    Network(&'static str),
}

impl Reply {
    fn into_outcome(self, path: &str) -> Result<Payload> {
        match self {
            Reply::Json(v) => Ok(Payload::Structured(v)),
            Reply::Binary {
                content_type,
                file_name,
                data,
            } => Ok(Payload::Binary(BinaryBody {
                content_type: content_type.to_string(),
                file_name: file_name.map(str::to_string),
                data: Bytes::from_static(data),
            })),
            Reply::Text(t) => Ok(Payload::Text(t.to_string())),
            Reply::Status(status, body) => Err(Error::RequestFailed {
                status,
                path: path.to_string(),
                message: body.get("error").and_then(|e| e.as_str()).map(str::to_string),
            }),
            Reply::Network(msg) => Err(TransportError::Connect(msg.to_string()).into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Captured {
    pub endpoint: Endpoint,
    pub body: Option<RequestBody>,
    pub at: Instant,
}

impl Captured {
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Some(RequestBody::Json(v)) => Some(v),
            _ => None,
        }
    }
}

/// Transport double with per-route response queues.
///
/// A route answers from its queue first, then from its sticky reply, else 404.
#[derive(Default)]
pub struct MockTransport {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<String, Reply>>,
    latency: Mutex<Duration>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<Captured>>,
}

fn route(method: HttpMethod, path: &str) -> String {
    format!("{} {}", method, path)
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Route-specific latency, used instead of the shared one.
    pub fn delay(&self, endpoint: &Endpoint, latency: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(route(endpoint.method(), &endpoint.path()), latency);
    }

    pub fn push(&self, endpoint: &Endpoint, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(route(endpoint.method(), &endpoint.path()))
            .or_default()
            .push_back(reply);
    }

    pub fn always(&self, endpoint: &Endpoint, reply: Reply) {
        self.sticky
            .lock()
            .unwrap()
            .insert(route(endpoint.method(), &endpoint.path()), reply);
    }

    pub fn calls(&self) -> Vec<Captured> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, endpoint: &Endpoint) -> Vec<Captured> {
        self.calls()
            .into_iter()
            .filter(|c| &c.endpoint == endpoint)
            .collect()
    }

    fn next_reply(&self, key: &str) -> Option<Reply> {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(|q| q.pop_front())
        {
            return Some(reply);
        }
        self.sticky.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<Payload> {
        let path = request.path();
        let key = route(request.method(), &path);
        self.calls.lock().unwrap().push(Captured {
            endpoint: request.endpoint.clone(),
            body: request.body.clone(),
            at: Instant::now(),
        });

        let latency = self
            .delays
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .unwrap_or_else(|| *self.latency.lock().unwrap());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let (Some(progress), Some(RequestBody::Multipart(form))) =
            (&request.progress, &request.body)
        {
            let total = form.total_file_bytes();
            progress(UploadProgress::new(total / 2, total));
            progress(UploadProgress::new(total, total));
        }

        match self.next_reply(&key) {
            Some(reply) => reply.into_outcome(&path),
            None => Reply::Status(404, serde_json::json!({"error": "Not found"}))
                .into_outcome(&path),
        }
    }
}

/// Client over `transport` with short, test-friendly timings.
pub fn client_with(transport: Arc<MockTransport>) -> (VoiceClient, Arc<RecordingObserver>) {
    client_with_config(transport, test_config())
}

pub fn client_with_config(
    transport: Arc<MockTransport>,
    config: ClientConfig,
) -> (VoiceClient, Arc<RecordingObserver>) {
    let recorder = Arc::new(RecordingObserver::new(1000));
    let client = VoiceClient::builder()
        .config(config)
        .transport(transport)
        .observer(recorder.clone())
        .build()
        .unwrap();
    (client, recorder)
}

pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.base_url = "http://voiceclone.test".into();
    config
}

pub fn voices_body() -> Value {
    serde_json::json!({
        "builtin_voices": [
            {"id": "sarah_us", "name": "Sarah", "language": "en-US", "type": "builtin"},
            {"id": "david_uk", "name": "David", "language": "en-GB", "type": "builtin"}
        ],
        "custom_voices": [],
        "total_count": 2
    })
}

pub fn status_body(status: &str, progress: u8) -> Value {
    serde_json::json!({"status": status, "progress": progress})
}
