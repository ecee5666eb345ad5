//! Long-running flows: waiting on synthesis and clone jobs.

use super::validation;
use super::VoiceClient;
use crate::jobs::{Job, JobKind, JobStatus, GENERIC_FAILURE};
use crate::transport::Endpoint;
use crate::types::{AudioClip, CloneRequest, SynthesisRequest};
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

fn status_endpoint(kind: JobKind, id: &str) -> Endpoint {
    match kind {
        JobKind::Synthesis => Endpoint::SynthesisStatus(id.to_string()),
        JobKind::Clone => Endpoint::CloneStatus(id.to_string()),
    }
}

impl VoiceClient {
    /// Poll a synthesis job until it completes, fails, or the poll deadline passes.
    pub async fn wait_for_synthesis(&self, job_id: &str) -> Result<Job> {
        self.wait_for(JobKind::Synthesis, job_id, &CancellationToken::new())
            .await
    }

    pub async fn wait_for_synthesis_with_cancel(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Job> {
        self.wait_for(JobKind::Synthesis, job_id, cancel).await
    }

    /// Poll a voice clone until training completes, fails, or the poll deadline passes.
    pub async fn wait_for_clone(&self, voice_id: &str) -> Result<Job> {
        self.wait_for(JobKind::Clone, voice_id, &CancellationToken::new())
            .await
    }

    pub async fn wait_for_clone_with_cancel(
        &self,
        voice_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Job> {
        self.wait_for(JobKind::Clone, voice_id, cancel).await
    }

    async fn wait_for(&self, kind: JobKind, id: &str, cancel: &CancellationToken) -> Result<Job> {
        let (operation, field) = match kind {
            JobKind::Synthesis => ("wait_for_synthesis", "job_id"),
            JobKind::Clone => ("wait_for_clone", "voice_id"),
        };
        let scope = self
            .events
            .begin_as(operation, &status_endpoint(kind, id.trim()));
        let outcome: Result<Job> = async {
            let id = validation::require_id(field, id)?;
            self.poller
                .poll_observed(
                    id,
                    |id| self.sample_job(kind, id),
                    cancel,
                    |job| scope.job_update(job),
                )
                .await
        }
        .await;
        scope.finish(outcome)
    }

    /// One status sample bypassing the cache; the fresh result refreshes it.
    async fn sample_job(&self, kind: JobKind, id: String) -> Result<Job> {
        let payload = self.fetch(status_endpoint(kind, &id)).await?;
        Job::from_status(id, kind, payload.decode()?)
    }

    /// Synthesize, wait for the job unless it already finished, then download the audio.
    pub async fn synthesize_and_download(&self, request: &SynthesisRequest) -> Result<AudioClip> {
        let job = self.synthesize_speech(request).await?;
        let created = serde_json::to_value(&job)?;
        self.settle_created(JobKind::Synthesis, &job.job_id, &job.status, None, created)
            .await?;
        self.download_audio(&job.job_id).await
    }

    /// Clone a voice and wait for training to finish.
    pub async fn clone_and_wait(&self, request: &CloneRequest) -> Result<Job> {
        let job = self.clone_voice(request).await?;
        let created = serde_json::to_value(&job)?;
        self.settle_created(
            JobKind::Clone,
            &job.voice_id,
            &job.status,
            job.message.as_deref(),
            created,
        )
        .await
    }

    /// Resolve a freshly created job: terminal states short-circuit, anything else is polled.
    async fn settle_created(
        &self,
        kind: JobKind,
        id: &str,
        status: &str,
        message: Option<&str>,
        created: serde_json::Value,
    ) -> Result<Job> {
        match JobStatus::parse(status) {
            JobStatus::Completed => {
                info!(job_id = id, kind = %kind, "job finished on creation");
                Ok(Job {
                    id: id.to_string(),
                    kind,
                    status: JobStatus::Completed,
                    progress: Some(100),
                    stage: None,
                    result: Some(created),
                    error: None,
                })
            }
            JobStatus::Failed => Err(Error::JobFailed {
                job_id: id.to_string(),
                kind,
                message: message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(GENERIC_FAILURE)
                    .to_string(),
            }),
            JobStatus::Queued | JobStatus::Processing => {
                self.wait_for(kind, id, &CancellationToken::new()).await
            }
        }
    }
}
