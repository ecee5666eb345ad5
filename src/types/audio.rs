//! Audio formats and binary audio payloads.

use crate::transport::BinaryBody;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio container formats accepted or produced by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Ogg,
    Flac,
    M4a,
    Aac,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::M4a => "audio/mp4",
            Self::Aac => "audio/aac",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::Aac => "aac",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" | "wave" => Some(Self::Wav),
            "ogg" | "oga" => Some(Self::Ogg),
            "flac" => Some(Self::Flac),
            "m4a" | "mp4" => Some(Self::M4a),
            "aac" => Some(Self::Aac),
            _ => None,
        }
    }

    /// Parameters like `; charset=...` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        match essence.to_ascii_lowercase().as_str() {
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/ogg" => Some(Self::Ogg),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/mp4" | "audio/x-m4a" => Some(Self::M4a),
            "audio/aac" => Some(Self::Aac),
            _ => None,
        }
    }

    /// Format implied by a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_extension(s).ok_or_else(|| {
            crate::Error::validation("format", format!("unsupported audio format `{}`", s))
        })
    }
}

/// Downloaded or previewed audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// `None` when neither the content type nor the file name identify a known format.
    pub format: Option<AudioFormat>,
    pub content_type: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl AudioClip {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Suggested file name: the server's, else `<stem>.<ext>`.
    pub fn suggested_file_name(&self, stem: &str) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => {
                let ext = self.format.unwrap_or_default().extension();
                format!("{}.{}", stem, ext)
            }
        }
    }
}

impl From<BinaryBody> for AudioClip {
    fn from(body: BinaryBody) -> Self {
        let format = AudioFormat::from_mime(&body.content_type).or_else(|| {
            body.file_name
                .as_deref()
                .and_then(AudioFormat::from_file_name)
        });
        Self {
            format,
            content_type: body.content_type,
            file_name: body.file_name,
            data: body.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lookups() {
        assert_eq!(AudioFormat::from_extension(".WAV"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_mime("audio/mpeg; q=1"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_file_name("take.2.flac"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::from_file_name("noext"), None);
        assert!("exe".parse::<AudioFormat>().is_err());
        assert_eq!("ogg".parse::<AudioFormat>().unwrap(), AudioFormat::Ogg);
    }

    #[test]
    fn test_clip_from_binary_body() {
        let clip = AudioClip::from(BinaryBody {
            content_type: "application/octet-stream".into(),
            file_name: Some("job-1.wav".into()),
            data: Bytes::from_static(b"RIFF"),
        });
        assert_eq!(clip.format, Some(AudioFormat::Wav));
        assert_eq!(clip.suggested_file_name("x"), "job-1.wav");

        let clip = AudioClip::from(BinaryBody {
            content_type: "audio/mpeg".into(),
            file_name: None,
            data: Bytes::new(),
        });
        assert!(clip.is_empty());
        assert_eq!(clip.suggested_file_name("preview"), "preview.mp3");
    }

    #[test]
    fn test_serde_is_lowercase() {
        assert_eq!(serde_json::to_value(AudioFormat::M4a).unwrap(), "m4a");
    }
}
