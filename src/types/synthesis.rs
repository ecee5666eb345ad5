use super::audio::AudioFormat;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VOICE_ID: &str = "sarah_us";

pub const SPEED_RANGE: (f64, f64) = (0.1, 3.0);
pub const PITCH_RANGE: (f64, f64) = (0.1, 2.0);
pub const VOLUME_RANGE: (f64, f64) = (0.0, 1.0);

/// Parameters of one speech synthesis.
///
/// Out-of-range numbers are clamped when the request is sent, not rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub speed: f64,
    pub pitch: f64,
    pub volume: f64,
    pub format: AudioFormat,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            speed: 1.0,
            pitch: 1.0,
            volume: 1.0,
            format: AudioFormat::default(),
        }
    }

    pub fn voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }
}

/// Creation response of `POST /api/tts/synthesize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisJob {
    pub job_id: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub duration_estimate: Option<f64>,
}

fn default_status() -> String {
    "queued".to_string()
}
