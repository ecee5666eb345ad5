//! 弹性模式模块：请求去重与指数退避重试。
//!
//! # Resilience Primitives Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`InFlightRegistry`] | Shares one pending outcome among concurrent identical requests |
//! | [`RetryPolicy`] | Bounded retries with pure exponential backoff |
//!
//! ```rust
//! use voiceclone_client::resilience::{RetryConfig, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(
//!     RetryConfig::new()
//!         .with_max_attempts(3)
//!         .with_initial_delay(Duration::from_millis(500)),
//! );
//! assert_eq!(policy.backoff(2), Duration::from_millis(1000));
//! ```

pub mod inflight;
pub mod retry;

pub use inflight::InFlightRegistry;
pub use retry::{with_retry, ResiliencePolicy, RetryConfig, RetryPolicy};
