//! Multi-part upload bodies with byte-level progress reporting.

use crate::transport::TransportError;
use crate::Result;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const CHUNK_SIZE: usize = 64 * 1024;

/// Progress of an upload, reported as payload bytes are handed to the body stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
    /// 0.0 ..= 100.0
    pub percent: f64,
}

impl UploadProgress {
    pub fn new(sent: u64, total: u64) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            (sent.min(total) as f64 / total as f64) * 100.0
        };
        Self {
            sent,
            total,
            percent,
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// A file attached to a multi-part request.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn total_file_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.data.len() as u64).sum()
    }

    pub(crate) fn into_form(self, tracker: Option<Arc<ProgressTracker>>) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let part = match &tracker {
                Some(tracker) => tracked_part(&file, Arc::clone(tracker)),
                None => Part::bytes(file.data.to_vec()),
            };
            let part = part
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(TransportError::from)?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

fn tracked_part(file: &FilePart, tracker: Arc<ProgressTracker>) -> Part {
    let data = file.data.clone();
    let len = data.len() as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
        .collect();
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        tracker.advance(chunk.len() as u64);
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    Part::stream_with_length(reqwest::Body::wrap_stream(stream), len)
}

/// Accumulates sent bytes across all parts of one request.
pub(crate) struct ProgressTracker {
    sent: AtomicU64,
    total: u64,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            sent: AtomicU64::new(0),
            total,
            callback,
        }
    }

    pub(crate) fn advance(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        (self.callback)(UploadProgress::new(sent, self.total));
    }

    pub(crate) fn finish(&self) {
        self.sent.store(self.total, Ordering::Relaxed);
        (self.callback)(UploadProgress::new(self.total, self.total));
    }
}
