use super::audio::AudioFormat;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneQuality {
    Draft,
    #[default]
    Standard,
    High,
    Premium,
}

impl CloneQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloneQuality::Draft => "draft",
            CloneQuality::Standard => "standard",
            CloneQuality::High => "high",
            CloneQuality::Premium => "premium",
        }
    }
}

impl fmt::Display for CloneQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CloneQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(CloneQuality::Draft),
            "standard" => Ok(CloneQuality::Standard),
            "high" => Ok(CloneQuality::High),
            "premium" => Ok(CloneQuality::Premium),
            other => Err(Error::validation(
                "quality",
                format!("unknown clone quality `{}`", other),
            )),
        }
    }
}

/// One voice sample to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub file_name: String,
    pub data: Bytes,
}

impl AudioFile {
    pub fn from_bytes(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::validation_with_context(
                    "audio file path has no file name",
                    ErrorContext::new()
                        .with_field_path("audio_files")
                        .with_details(path.display().to_string()),
                )
            })?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            Error::validation_with_context(
                format!("cannot read audio file: {}", e),
                ErrorContext::new()
                    .with_field_path("audio_files")
                    .with_details(path.display().to_string()),
            )
        })?;
        Ok(Self::from_bytes(file_name, data))
    }

    /// Lower-cased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn format(&self) -> Option<AudioFormat> {
        AudioFormat::from_file_name(&self.file_name)
    }

    pub fn content_type(&self) -> &'static str {
        self.format()
            .map(|f| f.mime_type())
            .unwrap_or("application/octet-stream")
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioFile")
            .field("file_name", &self.file_name)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloneRequest {
    pub audio_files: Vec<AudioFile>,
    pub voice_name: String,
    pub quality: CloneQuality,
    pub language: String,
}

impl CloneRequest {
    pub fn new(voice_name: impl Into<String>) -> Self {
        Self {
            audio_files: Vec::new(),
            voice_name: voice_name.into(),
            quality: CloneQuality::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn file(mut self, file: AudioFile) -> Self {
        self.audio_files.push(file);
        self
    }

    pub fn files(mut self, files: impl IntoIterator<Item = AudioFile>) -> Self {
        self.audio_files.extend(files);
        self
    }

    pub fn quality(mut self, quality: CloneQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn total_bytes(&self) -> u64 {
        self.audio_files.iter().map(|f| f.len() as u64).sum()
    }
}

/// Creation response of `POST /api/voices/clone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneJob {
    pub voice_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub training_time: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
}

fn default_status() -> String {
    "queued".to_string()
}
