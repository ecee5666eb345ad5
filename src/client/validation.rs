//! 请求参数校验：在任何网络调用之前拒绝无效输入。
//!
//! Request validation. Everything here runs before a request is built, so a
//! rejected call never reaches the transport.

use crate::config::UploadConfig;
use crate::transport::{FilePart, MultipartPayload};
use crate::types::synthesis::{
    SynthesisRequest, DEFAULT_VOICE_ID, PITCH_RANGE, SPEED_RANGE, VOLUME_RANGE,
};
use crate::types::{AudioFile, CloneRequest};
use crate::{Error, ErrorContext, Result};
use serde_json::json;

pub(crate) const CLONE_FILES_FIELD: &str = "audio_files";
pub(crate) const UPLOAD_FILE_FIELD: &str = "file";

/// Trimmed, non-empty identifier.
pub(crate) fn require_id<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

/// NaN falls back to `default`, everything else is clamped into `range`.
pub(crate) fn clamp_param(value: f64, default: f64, range: (f64, f64)) -> f64 {
    let value = if value.is_nan() { default } else { value };
    value.clamp(range.0, range.1)
}

pub(crate) fn synthesis_body(request: &SynthesisRequest) -> Result<serde_json::Value> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(Error::validation("text", "text must not be empty"));
    }
    let voice_id = match request.voice_id.trim() {
        "" => DEFAULT_VOICE_ID,
        id => id,
    };
    Ok(json!({
        "text": text,
        "voice_id": voice_id,
        "speed": clamp_param(request.speed, 1.0, SPEED_RANGE),
        "pitch": clamp_param(request.pitch, 1.0, PITCH_RANGE),
        "volume": clamp_param(request.volume, 1.0, VOLUME_RANGE),
        "format": request.format.extension(),
    }))
}

fn check_file(file: &AudioFile, field: &str, limits: &UploadConfig) -> Result<()> {
    if file.file_name.trim().is_empty() {
        return Err(Error::validation(field, "audio file has no name"));
    }
    match file.extension() {
        Some(ext) if limits.allows_extension(&ext) => Ok(()),
        _ => Err(Error::validation_with_context(
            format!("unsupported audio file `{}`", file.file_name),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(file.file_name.clone())
                .with_source("request_validator")
                .with_hint(format!("use one of: {}", limits.allowed_extensions.join(", "))),
        )),
    }
}

fn check_size(total: u64, field: &str, limits: &UploadConfig) -> Result<()> {
    if total > limits.max_upload_bytes {
        return Err(Error::validation_with_context(
            format!(
                "upload of {} bytes exceeds the {} byte limit",
                total, limits.max_upload_bytes
            ),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("request_validator"),
        ));
    }
    Ok(())
}

fn file_part(field: &str, file: &AudioFile) -> FilePart {
    FilePart {
        field: field.to_string(),
        file_name: file.file_name.clone(),
        content_type: file.content_type().to_string(),
        data: file.data.clone(),
    }
}

pub(crate) fn clone_payload(request: &CloneRequest, limits: &UploadConfig) -> Result<MultipartPayload> {
    if request.audio_files.is_empty() {
        return Err(Error::validation(
            CLONE_FILES_FIELD,
            "at least one audio file is required",
        ));
    }
    let name = request.voice_name.trim();
    if name.is_empty() {
        return Err(Error::validation("voice_name", "voice name must not be empty"));
    }
    for file in &request.audio_files {
        check_file(file, CLONE_FILES_FIELD, limits)?;
    }
    check_size(request.total_bytes(), CLONE_FILES_FIELD, limits)?;

    let language = match request.language.trim() {
        "" => crate::types::cloning::DEFAULT_LANGUAGE,
        lang => lang,
    };
    let payload = request.audio_files.iter().fold(
        MultipartPayload::new()
            .text("voice_name", name)
            .text("quality", request.quality.as_str())
            .text("language", language),
        |payload, file| payload.file(file_part(CLONE_FILES_FIELD, file)),
    );
    Ok(payload)
}

pub(crate) fn upload_payload(file: &AudioFile, limits: &UploadConfig) -> Result<MultipartPayload> {
    check_file(file, UPLOAD_FILE_FIELD, limits)?;
    check_size(file.len() as u64, UPLOAD_FILE_FIELD, limits)?;
    Ok(MultipartPayload::new().file(file_part(UPLOAD_FILE_FIELD, file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AudioFormat, CloneQuality};
    use crate::ErrorKind;

    #[test]
    fn test_clamp_param() {
        assert_eq!(clamp_param(10.0, 1.0, SPEED_RANGE), 3.0);
        assert_eq!(clamp_param(0.0, 1.0, SPEED_RANGE), 0.1);
        assert_eq!(clamp_param(-1.0, 1.0, VOLUME_RANGE), 0.0);
        assert_eq!(clamp_param(f64::NAN, 1.0, PITCH_RANGE), 1.0);
        assert_eq!(clamp_param(f64::INFINITY, 1.0, PITCH_RANGE), 2.0);
    }

    #[test]
    fn test_synthesis_body_trims_and_clamps() {
        let body = synthesis_body(
            &SynthesisRequest::new("  hi  ")
                .voice(" ")
                .speed(10.0)
                .volume(2.0)
                .format(AudioFormat::Wav),
        )
        .unwrap();
        assert_eq!(body["text"], "hi");
        assert_eq!(body["voice_id"], "sarah_us");
        assert_eq!(body["speed"].as_f64().unwrap(), 3.0);
        assert_eq!(body["pitch"].as_f64().unwrap(), 1.0);
        assert_eq!(body["volume"].as_f64().unwrap(), 1.0);
        assert_eq!(body["format"], "wav");
    }

    #[test]
    fn test_synthesis_body_keeps_decimal_values_exact() {
        let body = synthesis_body(&SynthesisRequest::new("hi").speed(1.2).pitch(0.1).volume(0.7))
            .unwrap();
        let text = serde_json::to_string(&body).unwrap();
        let number = |key: &str| {
            let start = text.find(&format!("\"{}\":", key)).unwrap() + key.len() + 3;
            let rest = &text[start..];
            rest[..rest.find(|c| c == ',' || c == '}').unwrap()].to_string()
        };
        assert_eq!(number("speed"), "1.2", "{}", text);
        assert_eq!(number("pitch"), "0.1", "{}", text);
        assert_eq!(number("volume"), "0.7", "{}", text);
    }

    #[test]
    fn test_blank_text_rejected() {
        let err = synthesis_body(&SynthesisRequest::new(" \n\t")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("text")
        );
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("job_id", " j-1 ").unwrap(), "j-1");
        assert!(require_id("job_id", "   ").is_err());
    }

    fn sample(name: &str, len: usize) -> AudioFile {
        AudioFile::from_bytes(name, vec![1u8; len])
    }

    #[test]
    fn test_clone_payload_fields() {
        let payload = clone_payload(
            &CloneRequest::new("  Narrator ")
                .file(sample("a.wav", 4))
                .file(sample("b.MP3", 6))
                .quality(CloneQuality::High)
                .language(""),
            &UploadConfig::default(),
        )
        .unwrap();
        assert_eq!(payload.field("voice_name"), Some("Narrator"));
        assert_eq!(payload.field("quality"), Some("high"));
        assert_eq!(payload.field("language"), Some("en-US"));
        assert_eq!(payload.files.len(), 2);
        assert!(payload.files.iter().all(|f| f.field == CLONE_FILES_FIELD));
        assert_eq!(payload.files[1].content_type, "audio/mpeg");
        assert_eq!(payload.total_file_bytes(), 10);
    }

    #[test]
    fn test_clone_payload_rejections() {
        let limits = UploadConfig::default();
        assert!(clone_payload(&CloneRequest::new("x"), &limits).is_err());
        assert!(clone_payload(&CloneRequest::new(" ").file(sample("a.wav", 1)), &limits).is_err());
        assert!(clone_payload(&CloneRequest::new("x").file(sample("a.exe", 1)), &limits).is_err());
        assert!(clone_payload(&CloneRequest::new("x").file(sample("", 1)), &limits).is_err());

        let tight = UploadConfig {
            max_upload_bytes: 8,
            ..UploadConfig::default()
        };
        let err = clone_payload(
            &CloneRequest::new("x").file(sample("a.wav", 5)).file(sample("b.wav", 5)),
            &tight,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_upload_payload() {
        let payload = upload_payload(&sample("take.flac", 3), &UploadConfig::default()).unwrap();
        assert_eq!(payload.files[0].field, "file");
        assert!(upload_payload(&sample("take.txt", 3), &UploadConfig::default()).is_err());
    }
}
