//! Endpoint catalogue of the VoiceClone HTTP API.

use super::HttpMethod;
use crate::cache::RequestKey;

/// Every path the client can address. Ids are percent-encoded into the template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    Voices,
    Synthesize,
    SynthesisStatus(String),
    Download(String),
    CloneVoice,
    CloneStatus(String),
    DeleteVoice(String),
    PreviewVoice(String),
    Analytics,
    Upload,
}

impl Endpoint {
    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Synthesize | Endpoint::CloneVoice | Endpoint::Upload => HttpMethod::Post,
            Endpoint::DeleteVoice(_) => HttpMethod::Delete,
            _ => HttpMethod::Get,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::Health => "/api/health".to_string(),
            Endpoint::Voices => "/api/voices".to_string(),
            Endpoint::Synthesize => "/api/tts/synthesize".to_string(),
            Endpoint::SynthesisStatus(id) => format!("/api/tts/status/{}", segment(id)),
            Endpoint::Download(id) => format!("/api/tts/download/{}", segment(id)),
            Endpoint::CloneVoice => "/api/voices/clone".to_string(),
            Endpoint::CloneStatus(id) => format!("/api/voices/clone/status/{}", segment(id)),
            Endpoint::DeleteVoice(id) => format!("/api/voices/{}", segment(id)),
            Endpoint::PreviewVoice(id) => format!("/api/voices/{}/preview", segment(id)),
            Endpoint::Analytics => "/api/analytics".to_string(),
            Endpoint::Upload => "/api/upload".to_string(),
        }
    }

    /// Operation name used in events and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Endpoint::Health => "health_check",
            Endpoint::Voices => "get_voices",
            Endpoint::Synthesize => "synthesize_speech",
            Endpoint::SynthesisStatus(_) => "get_synthesis_status",
            Endpoint::Download(_) => "download_audio",
            Endpoint::CloneVoice => "clone_voice",
            Endpoint::CloneStatus(_) => "get_clone_status",
            Endpoint::DeleteVoice(_) => "delete_voice",
            Endpoint::PreviewVoice(_) => "preview_voice",
            Endpoint::Analytics => "get_analytics",
            Endpoint::Upload => "upload_file",
        }
    }

    pub fn is_safe(&self) -> bool {
        self.method().is_safe()
    }

    /// Safe reads whose results may be served from the response cache.
    ///
    /// Downloads are shared between concurrent callers but not retained.
    pub fn is_cacheable(&self) -> bool {
        self.is_safe() && !matches!(self, Endpoint::Download(_))
    }

    pub fn request_key(&self) -> RequestKey {
        RequestKey::new(self.method(), self.path())
    }
}

// form encoding writes spaces as `+`; literal `+` is already escaped
fn segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_match_api_templates() {
        assert_eq!(Endpoint::Health.path(), "/api/health");
        assert_eq!(
            Endpoint::SynthesisStatus("abc".into()).path(),
            "/api/tts/status/abc"
        );
        assert_eq!(
            Endpoint::CloneStatus("v1".into()).path(),
            "/api/voices/clone/status/v1"
        );
        assert_eq!(
            Endpoint::PreviewVoice("sarah_us".into()).path(),
            "/api/voices/sarah_us/preview"
        );
        assert_eq!(Endpoint::DeleteVoice("v1".into()).method(), HttpMethod::Delete);
    }

    #[test]
    fn test_ids_are_percent_encoded() {
        assert_eq!(
            Endpoint::DeleteVoice("a/b c".into()).path(),
            "/api/voices/a%2Fb%20c"
        );
        assert_eq!(
            Endpoint::CloneStatus("x+y".into()).path(),
            "/api/voices/clone/status/x%2By"
        );
    }

    #[test]
    fn test_mutating_endpoints_are_not_cacheable() {
        for ep in [
            Endpoint::Synthesize,
            Endpoint::CloneVoice,
            Endpoint::Upload,
            Endpoint::DeleteVoice("v".into()),
        ] {
            assert!(!ep.is_safe(), "{:?} must not be safe", ep);
            assert!(!ep.is_cacheable(), "{:?} must not be cacheable", ep);
        }
        assert!(Endpoint::Voices.is_cacheable());
        assert!(Endpoint::Download("j".into()).is_safe());
        assert!(!Endpoint::Download("j".into()).is_cacheable());
    }
}
