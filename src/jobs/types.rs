//! Remote job snapshots.

use crate::transport::TransportError;
use crate::Result;
use serde::Serialize;
use std::fmt;

/// What kind of long-running operation a job represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Synthesis,
    Clone,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobKind::Synthesis => "synthesis",
            JobKind::Clone => "clone",
        })
    }
}

/// Job status as sampled from the server. The server owns the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Maps server vocabulary onto the four client-side states.
    ///
    /// Unrecognised values are treated as still running.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" | "waiting" => JobStatus::Queued,
            "completed" | "complete" | "succeeded" | "success" | "done" => JobStatus::Completed,
            "failed" | "error" | "errored" => JobStatus::Failed,
            _ => JobStatus::Processing,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const GENERIC_FAILURE: &str = "job reported failure without detail";

/// One observation of a remote job.
///
/// `result` is present iff `status` is completed, `error` iff it is failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub stage: Option<String>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl Job {
    /// Build a job from a status document such as
    /// `{"status": "processing", "progress": 50, "current_stage": "..."}`.
    pub fn from_status(
        id: impl Into<String>,
        kind: JobKind,
        document: serde_json::Value,
    ) -> Result<Self> {
        let raw_status = document
            .get("status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                TransportError::Decode("job status document has no `status` field".to_string())
            })?;
        let status = JobStatus::parse(raw_status);
        let progress = document
            .get("progress")
            .and_then(|v| v.as_f64())
            .map(|p| p.clamp(0.0, 100.0).round() as u8);
        let stage = document
            .get("current_stage")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let (result, error) = match status {
            JobStatus::Completed => (Some(document), None),
            JobStatus::Failed => {
                let text = |field: &str| {
                    document
                        .get(field)
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.trim().is_empty())
                };
                let reported = text("error")
                    .or_else(|| text("message"))
                    .unwrap_or(GENERIC_FAILURE);
                (None, Some(reported.to_string()))
            }
            _ => (None, None),
        };

        Ok(Self {
            id: id.into(),
            kind,
            status,
            progress,
            stage,
            result,
            error,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_vocabulary() {
        assert_eq!(JobStatus::parse("queued"), JobStatus::Queued);
        assert_eq!(JobStatus::parse("training"), JobStatus::Processing);
        assert_eq!(JobStatus::parse("Processing"), JobStatus::Processing);
        assert_eq!(JobStatus::parse("completed"), JobStatus::Completed);
        assert_eq!(JobStatus::parse("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::parse("mystery"), JobStatus::Processing);
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_completed_job_carries_result() {
        let job = Job::from_status(
            "j1",
            JobKind::Synthesis,
            json!({"status": "completed", "progress": 100, "output_file": "j1.mp3"}),
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, Some(100));
        assert_eq!(job.result.as_ref().unwrap()["output_file"], "j1.mp3");
        assert!(job.error.is_none());
    }

    #[test]
    fn test_failed_job_without_message_gets_generic_error() {
        let job = Job::from_status("j2", JobKind::Clone, json!({"status": "failed"})).unwrap();
        assert_eq!(job.error.as_deref(), Some(GENERIC_FAILURE));
        assert!(job.result.is_none());

        let job = Job::from_status(
            "j3",
            JobKind::Synthesis,
            json!({"status": "failed", "error": "gTTS unavailable"}),
        )
        .unwrap();
        assert_eq!(job.error.as_deref(), Some("gTTS unavailable"));
    }

    #[test]
    fn test_missing_status_is_malformed() {
        let err = Job::from_status("j4", JobKind::Synthesis, json!({"progress": 3})).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Transport);
    }

    #[test]
    fn test_clone_status_document() {
        let job = Job::from_status(
            "v1",
            JobKind::Clone,
            json!({
                "voice_id": "v1",
                "status": "training",
                "progress": 42.4,
                "current_stage": "Extracting vocal features..."
            }),
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, Some(42));
        assert_eq!(job.stage.as_deref(), Some("Extracting vocal features..."));
    }
}
