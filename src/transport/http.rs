use super::{
    BinaryBody, HttpMethod, Payload, ProgressTracker, RequestBody, Transport, TransportError,
    TransportRequest,
};
use crate::config::ClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Proxy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration(format!("invalid proxy url {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, request: TransportRequest) -> Result<Payload> {
        let method = request.method();
        let path = request.path();
        let url = format!("{}{}", self.base_url, path);

        let mut req = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        // Our own correlation id. The server may ignore it.
        req = req.header("x-request-id", Uuid::new_v4().to_string());
        for (k, v) in &request.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let mut tracker = None;
        match request.body {
            Some(RequestBody::Json(body)) => {
                req = req.json(&body);
            }
            Some(RequestBody::Multipart(payload)) => {
                tracker = request.progress.map(|cb| {
                    Arc::new(ProgressTracker::new(payload.total_file_bytes(), cb))
                });
                req = req.multipart(payload.into_form(tracker.clone())?);
            }
            None => {}
        }

        let start = Instant::now();
        let response = req.send().await.map_err(TransportError::from)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(TransportError::from)?;

        debug!(
            method = method.as_str(),
            endpoint = path.as_str(),
            http_status = status,
            bytes = body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "voiceclone http exchange"
        );

        if !(200..300).contains(&status) {
            let message = server_message(&headers, &body);
            info!(
                http_status = status,
                endpoint = path.as_str(),
                message = message.as_deref().unwrap_or(""),
                "voiceclone request failed"
            );
            return Err(Error::RequestFailed {
                status,
                path,
                message,
            });
        }

        if let Some(tracker) = tracker {
            tracker.finish();
        }

        classify(&headers, body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<Payload> {
        self.execute(request).await
    }
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_ascii_lowercase())
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence == "application/json" || essence.ends_with("+json")
}

/// Map a 2xx response onto a [`Payload`] by its declared content type.
pub(crate) fn classify(headers: &HeaderMap, body: bytes::Bytes) -> Result<Payload> {
    let ct = content_type(headers);
    match ct.as_deref() {
        Some(ct) if is_json(ct) => {
            let value = serde_json::from_slice(&body)
                .map_err(|e| TransportError::Decode(format!("invalid JSON body: {}", e)))?;
            Ok(Payload::Structured(value))
        }
        Some(ct) if ct.starts_with("text/") => {
            Ok(Payload::Text(String::from_utf8_lossy(&body).into_owned()))
        }
        other => Ok(Payload::Binary(BinaryBody {
            content_type: other.unwrap_or("application/octet-stream").to_string(),
            file_name: attachment_name(headers),
            data: body,
        })),
    }
}

/// Extracts the `error`/`message` fields of a structured error body.
fn server_message(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    if !content_type(headers).map(|ct| is_json(&ct)).unwrap_or(false) {
        return None;
    }
    let json: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = json.get("error").and_then(|v| v.as_str());
    let message = json.get("message").and_then(|v| v.as_str());
    match (error, message) {
        (Some(e), Some(m)) if e != m => Some(format!("{}: {}", e, m)),
        (Some(e), _) => Some(e.to_string()),
        (None, Some(m)) => Some(m.to_string()),
        (None, None) => None,
    }
}

fn attachment_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    value.split(';').find_map(|part| {
        let part = part.trim();
        let name = part.strip_prefix("filename=")?;
        let name = name.trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}
