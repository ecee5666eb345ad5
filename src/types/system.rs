use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Per-service availability, e.g. `tts`, `voice_cloning`, `storage`.
    #[serde(default)]
    pub services: BTreeMap<String, bool>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") && self.services.values().all(|up| *up)
    }
}

/// `GET /api/analytics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub total_voices: u64,
    pub total_syntheses: u64,
    pub active_jobs: u64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    pub storage_used: f64,
    pub languages_supported: Vec<String>,
    pub uptime: Option<String>,
}

/// `DELETE /api/voices/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub voice_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_decodes() {
        let h: HealthStatus = serde_json::from_value(json!({
            "status": "healthy",
            "timestamp": "2024-05-01T10:00:00",
            "version": "1.0.0",
            "services": {"tts": true, "voice_cloning": true, "storage": true}
        }))
        .unwrap();
        assert!(h.is_healthy());

        let degraded: HealthStatus = serde_json::from_value(json!({
            "status": "healthy", "services": {"storage": false}
        }))
        .unwrap();
        assert!(!degraded.is_healthy());
    }

    #[test]
    fn test_analytics_tolerates_missing_fields() {
        let a: Analytics = serde_json::from_value(json!({
            "total_voices": 2, "languages_supported": ["en-US"], "extra": 1
        }))
        .unwrap();
        assert_eq!(a.total_voices, 2);
        assert_eq!(a.failed_jobs, 0);
        assert_eq!(a.languages_supported, vec!["en-US".to_string()]);
    }
}
