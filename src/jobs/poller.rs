//! Job polling.
//!
//! Each tick is scheduled `interval` after the previous one finished, so a
//! slow status call spaces out the following ones. The deadline is measured
//! from the first tick and checked before every later tick.

use super::types::{Job, JobStatus, GENERIC_FAILURE};
use crate::{Error, Result};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    #[serde(rename = "interval_ms", with = "crate::config::millis")]
    pub interval: Duration,
    #[serde(rename = "timeout_ms", with = "crate::config::millis")]
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            timeout: Duration::from_millis(300_000),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Where a poll ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Waiting,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollState {
    /// Terminal state implied by a finished poll.
    pub fn of(outcome: &Result<Job>) -> Self {
        match outcome {
            Ok(_) => PollState::Completed,
            Err(Error::JobFailed { .. }) => PollState::Failed,
            Err(Error::Timeout { .. }) => PollState::TimedOut,
            Err(Error::Cancelled { .. }) => PollState::Cancelled,
            // the fetch failed; the job itself was never seen to finish
            Err(_) => PollState::Waiting,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until the job completes, fails, or the deadline passes.
    pub async fn poll<F, Fut>(&self, job_id: &str, fetch: F) -> Result<Job>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Job>>,
    {
        self.poll_observed(job_id, fetch, &CancellationToken::new(), |_| {})
            .await
    }

    /// Like [`poll`](Self::poll), but `cancel` aborts early with [`Error::Cancelled`].
    pub async fn poll_with_cancel<F, Fut>(
        &self,
        job_id: &str,
        fetch: F,
        cancel: &CancellationToken,
    ) -> Result<Job>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Job>>,
    {
        self.poll_observed(job_id, fetch, cancel, |_| {}).await
    }

    /// Full form: `on_sample` sees every job snapshot, terminal or not.
    ///
    /// A failed status fetch ends the poll with that error.
    pub async fn poll_observed<F, Fut, O>(
        &self,
        job_id: &str,
        mut fetch: F,
        cancel: &CancellationToken,
        mut on_sample: O,
    ) -> Result<Job>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Job>>,
        O: FnMut(&Job),
    {
        let started = Instant::now();
        let cancelled = || Error::Cancelled {
            job_id: job_id.to_string(),
        };
        let mut ticks = 0u32;

        loop {
            if ticks > 0 {
                let elapsed = started.elapsed();
                if elapsed > self.config.timeout {
                    warn!(
                        job_id,
                        ticks,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "job poll timed out"
                    );
                    return Err(Error::Timeout {
                        job_id: job_id.to_string(),
                        elapsed,
                    });
                }
            }
            if cancel.is_cancelled() {
                info!(job_id, ticks, "job poll cancelled");
                return Err(cancelled());
            }

            let job = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(job_id, ticks, "job poll cancelled");
                    return Err(cancelled());
                }
                sample = fetch(job_id.to_string()) => sample?,
            };
            ticks += 1;
            on_sample(&job);

            match job.status {
                JobStatus::Completed => {
                    debug!(job_id, ticks, kind = %job.kind, "job completed");
                    return Ok(job);
                }
                JobStatus::Failed => {
                    let message = job
                        .error
                        .clone()
                        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                    info!(job_id, ticks, kind = %job.kind, error = message.as_str(), "job failed");
                    return Err(Error::JobFailed {
                        job_id: job_id.to_string(),
                        kind: job.kind,
                        message,
                    });
                }
                status => {
                    debug!(job_id, ticks, status = status.as_str(), progress = job.progress, "job still running");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(job_id, ticks, "job poll cancelled");
                    return Err(cancelled());
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}
