use super::validation;
use super::VoiceClient;
use crate::jobs::{Job, JobKind};
use crate::transport::{Endpoint, Payload, ProgressCallback, TransportRequest};
use crate::types::{
    Analytics, AudioClip, AudioFile, CloneJob, CloneRequest, DeleteAck, HealthStatus,
    VoiceCatalog, VoicePreview,
};
use crate::Result;
use tracing::info;

impl VoiceClient {
    pub async fn health_check(&self) -> Result<HealthStatus> {
        let endpoint = Endpoint::Health;
        let scope = self.events.begin(&endpoint);
        let outcome = match self.cached_read(endpoint, &scope).await {
            Ok(payload) => payload.decode(),
            Err(e) => Err(e),
        };
        scope.finish(outcome)
    }

    pub async fn get_voices(&self) -> Result<VoiceCatalog> {
        let endpoint = Endpoint::Voices;
        let scope = self.events.begin(&endpoint);
        let outcome = match self.cached_read(endpoint, &scope).await {
            Ok(payload) => payload.decode(),
            Err(e) => Err(e),
        };
        scope.finish(outcome)
    }

    pub async fn get_analytics(&self) -> Result<Analytics> {
        let endpoint = Endpoint::Analytics;
        let scope = self.events.begin(&endpoint);
        let outcome = match self.cached_read(endpoint, &scope).await {
            Ok(payload) => payload.decode(),
            Err(e) => Err(e),
        };
        scope.finish(outcome)
    }

    /// Upload samples and start cloning a voice. Sent once, never retried.
    pub async fn clone_voice(&self, request: &CloneRequest) -> Result<CloneJob> {
        self.clone_voice_inner(request, None).await
    }

    /// [`clone_voice`](Self::clone_voice) reporting upload progress to `progress`.
    pub async fn clone_voice_with_progress(
        &self,
        request: &CloneRequest,
        progress: ProgressCallback,
    ) -> Result<CloneJob> {
        self.clone_voice_inner(request, Some(progress)).await
    }

    async fn clone_voice_inner(
        &self,
        request: &CloneRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<CloneJob> {
        let endpoint = Endpoint::CloneVoice;
        let scope = self.events.begin(&endpoint);
        let outcome: Result<CloneJob> = async {
            let payload = validation::clone_payload(request, &self.config.upload)?;
            let files = payload.files.len();
            let bytes = payload.total_file_bytes();
            let request = TransportRequest::new(endpoint)
                .with_multipart(payload)
                .with_progress(scope.progress_reporter(progress));
            let job: CloneJob = self.mutate(request).await?.decode()?;
            self.invalidate(&[Endpoint::Voices, Endpoint::Analytics]);
            info!(
                voice_id = job.voice_id.as_str(),
                files,
                bytes,
                status = job.status.as_str(),
                "voice clone submitted"
            );
            Ok(job)
        }
        .await;
        scope.finish(outcome)
    }

    pub async fn get_clone_status(&self, voice_id: &str) -> Result<Job> {
        let endpoint = Endpoint::CloneStatus(voice_id.trim().to_string());
        let scope = self.events.begin(&endpoint);
        let outcome: Result<Job> = async {
            let id = validation::require_id("voice_id", voice_id)?;
            let payload = self.cached_read(endpoint, &scope).await?;
            Job::from_status(id, JobKind::Clone, payload.decode()?)
        }
        .await;
        scope.finish(outcome)
    }

    pub async fn delete_voice(&self, voice_id: &str) -> Result<DeleteAck> {
        let endpoint = Endpoint::DeleteVoice(voice_id.trim().to_string());
        let scope = self.events.begin(&endpoint);
        let outcome: Result<DeleteAck> = async {
            let id = validation::require_id("voice_id", voice_id)?;
            let ack: DeleteAck = self.mutate(TransportRequest::new(endpoint)).await?.decode()?;
            self.invalidate(&[
                Endpoint::Voices,
                Endpoint::Analytics,
                Endpoint::CloneStatus(id.to_string()),
                Endpoint::PreviewVoice(id.to_string()),
            ]);
            info!(voice_id = id, "voice deleted");
            Ok(ack)
        }
        .await;
        scope.finish(outcome)
    }

    /// Built-in voices answer with audio, custom voices with a description.
    pub async fn preview_voice(&self, voice_id: &str) -> Result<VoicePreview> {
        let endpoint = Endpoint::PreviewVoice(voice_id.trim().to_string());
        let scope = self.events.begin(&endpoint);
        let outcome: Result<VoicePreview> = async {
            validation::require_id("voice_id", voice_id)?;
            Ok(match self.cached_read(endpoint, &scope).await? {
                Payload::Binary(body) => VoicePreview::Audio(AudioClip::from(body)),
                Payload::Structured(value) => VoicePreview::Details(value),
                Payload::Text(text) => VoicePreview::Details(serde_json::Value::String(text)),
            })
        }
        .await;
        scope.finish(outcome)
    }

    /// Upload one audio file to `POST /api/upload` (multipart part `file`).
    pub async fn upload(
        &self,
        file: &AudioFile,
        progress: Option<ProgressCallback>,
    ) -> Result<serde_json::Value> {
        let endpoint = Endpoint::Upload;
        let scope = self.events.begin(&endpoint);
        let outcome: Result<serde_json::Value> = async {
            let payload = validation::upload_payload(file, &self.config.upload)?;
            let request = TransportRequest::new(endpoint)
                .with_multipart(payload)
                .with_progress(scope.progress_reporter(progress));
            self.mutate(request).await?.decode()
        }
        .await;
        scope.finish(outcome)
    }
}
