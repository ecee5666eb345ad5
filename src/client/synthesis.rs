use super::validation;
use super::VoiceClient;
use crate::jobs::{Job, JobKind};
use crate::transport::{Endpoint, TransportRequest};
use crate::types::{AudioClip, SynthesisJob, SynthesisRequest};
use crate::Result;
use tracing::info;

impl VoiceClient {
    /// Submit text for synthesis and return the job reference.
    ///
    /// Blank text is rejected; speed, pitch and volume are clamped into range.
    pub async fn synthesize_speech(&self, request: &SynthesisRequest) -> Result<SynthesisJob> {
        let endpoint = Endpoint::Synthesize;
        let scope = self.events.begin(&endpoint);
        let outcome: Result<SynthesisJob> = async {
            let body = validation::synthesis_body(request)?;
            let payload = self
                .mutate(TransportRequest::new(endpoint).with_json(body))
                .await?;
            let job: SynthesisJob = payload.decode()?;
            self.invalidate(&[Endpoint::Analytics]);
            info!(job_id = job.job_id.as_str(), status = job.status.as_str(), "synthesis submitted");
            Ok(job)
        }
        .await;
        scope.finish(outcome)
    }

    pub async fn get_synthesis_status(&self, job_id: &str) -> Result<Job> {
        let endpoint = Endpoint::SynthesisStatus(job_id.trim().to_string());
        let scope = self.events.begin(&endpoint);
        let outcome: Result<Job> = async {
            let id = validation::require_id("job_id", job_id)?;
            let payload = self.cached_read(endpoint, &scope).await?;
            Job::from_status(id, JobKind::Synthesis, payload.decode()?)
        }
        .await;
        scope.finish(outcome)
    }

    /// Fetch the audio of a completed synthesis. Shared between concurrent
    /// callers but never cached.
    pub async fn download_audio(&self, job_id: &str) -> Result<AudioClip> {
        let endpoint = Endpoint::Download(job_id.trim().to_string());
        let scope = self.events.begin(&endpoint);
        let outcome: Result<AudioClip> = async {
            validation::require_id("job_id", job_id)?;
            let body = self.fetch(endpoint).await?.into_binary()?;
            Ok(AudioClip::from(body))
        }
        .await;
        scope.finish(outcome)
    }
}
