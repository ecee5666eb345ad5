use crate::jobs::JobKind;
use crate::transport::TransportError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Where a validation or configuration error came from, and what would fix it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Offending request field or config key, e.g. `text` or `config.poll.interval_ms`.
    pub field_path: Option<String>,
    /// The rejected value or the limit it broke.
    pub details: Option<String>,
    /// Component that raised the error (`request_validator`, `config_loader`).
    pub source: Option<String>,
    pub hint: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.field_path.is_none()
            && self.details.is_none()
            && self.source.is_none()
            && self.hint.is_none()
    }
}

/// Renders as ` (field: text, hint: ...)`, or nothing when empty.
impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let labelled = [
            ("field", &self.field_path),
            ("details", &self.details),
            ("source", &self.source),
            ("hint", &self.hint),
        ];
        f.write_str(" (")?;
        let mut first = true;
        for (label, value) in labelled {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {}", label, value)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

/// Discriminant of [`Error`], stable across releases and cheap to match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Transport,
    RequestFailed,
    JobFailed,
    Timeout,
    Cancelled,
    Configuration,
    Serialization,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::RequestFailed => "request_failed",
            Self::JobFailed => "job_failed",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Configuration => "configuration",
            Self::Serialization => "serialization",
        }
    }
}

/// Unified error type for the VoiceClone client runtime.
///
/// `Clone` because a single de-duplicated request settles once and every
/// co-waiter receives the same outcome.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("invalid request: {message}{context}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Request failed: HTTP {status} on {path}{}", format_message(.message))]
    RequestFailed {
        status: u16,
        path: String,
        message: Option<String>,
    },

    #[error("{kind} job {job_id} failed: {message}")]
    JobFailed {
        job_id: String,
        kind: JobKind,
        message: String,
    },

    #[error("Job {job_id} did not finish within {} ms", .elapsed.as_millis())]
    Timeout { job_id: String, elapsed: Duration },

    #[error("Polling for job {job_id} was cancelled")]
    Cancelled { job_id: String },

    #[error("invalid configuration: {message}{context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("cannot encode or decode body: {0}")]
    Serialization(String),
}

fn format_message(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Shorthand for a validation error pinned to one request field.
    pub fn validation(field: &str, msg: impl Into<String>) -> Self {
        Self::validation_with_context(
            msg,
            ErrorContext::new()
                .with_field_path(field)
                .with_source("request_validator"),
        )
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Transport(_) => ErrorKind::Transport,
            Error::RequestFailed { .. } => ErrorKind::RequestFailed,
            Error::JobFailed { .. } => ErrorKind::JobFailed,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// HTTP status reported by the server, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a retry may succeed: network failures and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::RequestFailed { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    /// Field and hint details of validation and configuration errors.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. } | Error::Configuration { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
