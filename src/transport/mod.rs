//! 传输层：单次 HTTP 交换、按内容类型分类响应、非 2xx 状态映射为类型化错误。
//!
//! Transport layer.
//!
//! A [`Transport`] performs exactly one HTTP exchange per call. It never
//! retries, caches or de-duplicates; those concerns are layered on top by the
//! client. Responses are classified by their declared content type into a
//! [`Payload`].

mod endpoint;
mod http;
mod multipart;

pub use endpoint::Endpoint;
pub use http::HttpTransport;
pub use multipart::{FilePart, MultipartPayload, ProgressCallback, UploadProgress};

pub(crate) use multipart::ProgressTracker;

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// HTTP verbs used by the VoiceClone API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Safe methods have no server-side effect and may be cached or shared.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body accepted by [`Transport::send`].
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(MultipartPayload),
}

/// One outgoing HTTP exchange.
#[derive(Clone)]
pub struct TransportRequest {
    pub endpoint: Endpoint,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
    pub progress: Option<ProgressCallback>,
}

impl TransportRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            body: None,
            headers: Vec::new(),
            progress: None,
        }
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_multipart(mut self, payload: MultipartPayload) -> Self {
        self.body = Some(RequestBody::Multipart(payload));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.endpoint.method()
    }

    pub fn path(&self) -> String {
        self.endpoint.path()
    }
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("endpoint", &self.endpoint)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// A binary response body (audio downloads and previews).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBody {
    pub content_type: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// A successful response, tagged by the content kind the server declared.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(serde_json::Value),
    Binary(BinaryBody),
    Text(String),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Structured(_) => "structured",
            Payload::Binary(_) => "binary",
            Payload::Text(_) => "text",
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Decode a structured payload into a typed response.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        match self {
            Payload::Structured(value) => Ok(serde_json::from_value(value)?),
            other => Err(TransportError::Decode(format!(
                "expected structured payload, got {}",
                other.kind()
            ))
            .into()),
        }
    }

    pub fn into_binary(self) -> Result<BinaryBody> {
        match self {
            Payload::Binary(body) => Ok(body),
            other => Err(TransportError::Decode(format!(
                "expected binary payload, got {}",
                other.kind()
            ))
            .into()),
        }
    }
}

/// Network-level failure. Owned strings so the error stays `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_decode() || e.is_body() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Single HTTP exchange seam. Implemented by [`HttpTransport`] and by test doubles.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<Payload>;
}
