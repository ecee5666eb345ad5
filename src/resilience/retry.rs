//! Retry with exponential backoff.
//!
//! The policy decides *whether* and *when*; the caller decides *which*
//! operations are safe to wrap. Mutating calls are only wrapped when the call
//! site knows a repeat has no additional effect.

use crate::{Error, Result};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Configuration for retry logic
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    #[serde(rename = "initial_delay_ms", with = "crate::config::millis")]
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }
}

/// Decides whether a failed attempt should be repeated.
pub trait ResiliencePolicy: Send + Sync {
    /// `attempt` is the 1-based number of the attempt that just failed.
    fn should_retry(&self, attempt: u32, error: &Error) -> Option<Duration>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(RetryConfig::new().with_max_attempts(1))
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay after the given failed attempt: `initial_delay * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.initial_delay.as_millis() as u64;
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(base.saturating_mul(factor))
    }

    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        with_retry(self, operation).await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl ResiliencePolicy for RetryPolicy {
    fn should_retry(&self, attempt: u32, error: &Error) -> Option<Duration> {
        if attempt >= self.config.max_attempts || !error.is_retryable() {
            return None;
        }
        Some(self.backoff(attempt))
    }
}

/// Run `operation` until it succeeds or `policy` gives up.
///
/// The error of the final attempt is returned as-is.
pub async fn with_retry<P, F, Fut, T>(policy: &P, mut operation: F) -> Result<T>
where
    P: ResiliencePolicy + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => match policy.should_retry(attempt, &error) {
                Some(delay) => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error_kind = error.kind().as_str(),
                        http_status = error.status(),
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(error),
            },
        }
    }
}
