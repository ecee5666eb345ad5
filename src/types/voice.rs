use super::audio::AudioClip;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceKind {
    #[default]
    Builtin,
    Custom,
}

/// A voice model as listed by `GET /api/voices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: VoiceKind,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl Voice {
    pub fn is_custom(&self) -> bool {
        self.kind == VoiceKind::Custom
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceCatalog {
    #[serde(default)]
    pub builtin_voices: Vec<Voice>,
    #[serde(default)]
    pub custom_voices: Vec<Voice>,
    #[serde(default)]
    pub total_count: usize,
}

impl VoiceCatalog {
    /// Built-in voices first, then custom ones.
    pub fn all(&self) -> impl Iterator<Item = &Voice> {
        self.builtin_voices.iter().chain(self.custom_voices.iter())
    }

    pub fn find(&self, id: &str) -> Option<&Voice> {
        self.all().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.builtin_voices.len() + self.custom_voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of `GET /api/voices/{id}/preview`.
///
/// Built-in voices answer with audio; custom voices with a JSON description.
#[derive(Debug, Clone, PartialEq)]
pub enum VoicePreview {
    Audio(AudioClip),
    Details(serde_json::Value),
}

impl VoicePreview {
    pub fn audio(&self) -> Option<&AudioClip> {
        match self {
            VoicePreview::Audio(clip) => Some(clip),
            VoicePreview::Details(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_decodes_server_shape() {
        let catalog: VoiceCatalog = serde_json::from_value(json!({
            "builtin_voices": [{
                "id": "sarah_us", "name": "Sarah", "language": "en-US",
                "gender": "female", "accent": "American", "type": "builtin",
                "preview_url": "/api/voices/sarah_us/preview"
            }],
            "custom_voices": [{
                "id": "v-42", "name": "Narrator", "language": "en-GB",
                "quality": "high", "type": "custom", "created_at": "2024-01-01T00:00:00"
            }],
            "total_count": 2
        }))
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.total_count, 2);
        let ids: Vec<&str> = catalog.all().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["sarah_us", "v-42"]);
        assert!(catalog.find("v-42").unwrap().is_custom());
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let catalog: VoiceCatalog = serde_json::from_value(json!({})).unwrap();
        assert!(catalog.is_empty());
    }
}
