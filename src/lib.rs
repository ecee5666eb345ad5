//! # voiceclone-client
//!
//! VoiceClone 语音合成 / 声音克隆 HTTP 服务的客户端编排层。
//!
//! Request orchestration for the VoiceClone text-to-speech and voice-cloning
//! HTTP API.
//!
//! ## Overview
//!
//! The server owns synthesis, cloning, and storage. This crate owns what happens
//! on the client side of the wire: which calls are safe to cache or share, which may
//! be retried, how long-running jobs are followed to completion, and what gets
//! reported to observers along the way.
//!
//! - **Reads** (health, voices, status, analytics, preview) go through a
//!   time-bounded cache, are shared between concurrent identical callers, and are
//!   retried with exponential backoff on network failures and 5xx responses.
//! - **Mutations** (synthesize, clone, delete, upload) are sent exactly once per
//!   call. They are never cached, shared, or retried.
//! - **Jobs** are polled at a fixed interval after each sample until they complete,
//!   fail, time out, or are cancelled.
//! - **Events** (`requestStart`, `cacheHit`, `requestSuccess` / `requestError`,
//!   `requestEnd`, `jobUpdate`, `uploadProgress`) are published to subscribed
//!   observers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voiceclone_client::{SynthesisRequest, VoiceClient};
//!
//! #[tokio::main]
//! async fn main() -> voiceclone_client::Result<()> {
//!     let client = VoiceClient::builder()
//!         .base_url("http://localhost:5000")
//!         .from_env()
//!         .build()?;
//!
//!     let voices = client.get_voices().await?;
//!     println!("{} voices", voices.len());
//!
//!     let audio = client
//!         .synthesize_and_download(&SynthesisRequest::new("Hello there").speed(1.2))
//!         .await?;
//!     std::fs::write(audio.suggested_file_name("hello"), &audio.data).ok();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`VoiceClient`] and its builder |
//! | [`transport`] | Endpoint catalogue and the HTTP exchange |
//! | [`cache`] | Request keys and the response cache |
//! | [`resilience`] | In-flight sharing and retry |
//! | [`jobs`] | Job model and poller |
//! | [`events`] | Lifecycle event bus and observers |
//! | [`types`] | Request parameters and response bodies |
//! | [`config`] | Client configuration |

pub mod cache;
pub mod client;
pub mod config;
pub mod events;
pub mod jobs;
pub mod resilience;
pub mod transport;
pub mod types;

pub use client::{VoiceClient, VoiceClientBuilder};
pub use config::ClientConfig;
pub use events::{ClientEvent, EventKind, EventObserver, SubscriptionId};
pub use jobs::{Job, JobKind, JobStatus};
pub use transport::{Endpoint, Payload, ProgressCallback, Transport, UploadProgress};
pub use types::{
    Analytics, AudioClip, AudioFile, AudioFormat, CloneJob, CloneQuality, CloneRequest, DeleteAck,
    HealthStatus, SynthesisJob, SynthesisRequest, Voice, VoiceCatalog, VoicePreview,
};

pub use tokio_util::sync::CancellationToken;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
