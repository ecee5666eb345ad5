//! 客户端配置：默认值 → YAML 文件 → 环境变量 → 构建器调用。
//!
//! Client configuration.
//!
//! Durations are written in milliseconds (`*_ms` keys). The one exception is
//! `VOICECLONE_TIMEOUT_SECS`. Every field has a default, so an empty file is valid.
//!
//! ```yaml
//! base_url: http://voiceclone.internal:5000
//! cache:
//!   max_age_ms: 60000
//! retry:
//!   max_attempts: 4
//!   initial_delay_ms: 250
//! poll:
//!   interval_ms: 500
//!   timeout_ms: 120000
//! ```

use crate::cache::CacheConfig;
use crate::jobs::PollConfig;
use crate::resilience::RetryConfig;
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Serde adapter for durations stored as integer milliseconds.
pub(crate) mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_upload_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024,
            allowed_extensions: ["wav", "mp3", "ogg", "m4a", "flac", "aac"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl UploadConfig {
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(rename = "request_timeout_ms", with = "millis")]
    pub request_timeout: Duration,
    pub proxy_url: Option<String>,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub poll: PollConfig,
    pub upload: UploadConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            proxy_url: None,
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                format!("malformed YAML: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read {}: {}", path.display(), e),
                ErrorContext::new().with_source("config_loader"),
            )
        })?;
        debug!(path = %path.display(), "loaded client configuration file");
        Self::from_yaml_str(&text)
    }

    /// Defaults overlaid with `VOICECLONE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("VOICECLONE_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        if let Some(secs) = env_parse::<u64>("VOICECLONE_TIMEOUT_SECS") {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(proxy) = std::env::var("VOICECLONE_PROXY_URL") {
            if !proxy.trim().is_empty() {
                self.proxy_url = Some(proxy.trim().to_string());
            }
        }
        if let Some(ms) = env_parse::<u64>("VOICECLONE_CACHE_MAX_AGE_MS") {
            self.cache.max_age = Duration::from_millis(ms);
        }
        if let Some(enabled) = env_parse::<bool>("VOICECLONE_CACHE_ENABLED") {
            self.cache.enabled = enabled;
        }
        if let Some(n) = env_parse::<u32>("VOICECLONE_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = n;
        }
        if let Some(ms) = env_parse::<u64>("VOICECLONE_RETRY_INITIAL_DELAY_MS") {
            self.retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("VOICECLONE_POLL_INTERVAL_MS") {
            self.poll.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("VOICECLONE_POLL_TIMEOUT_MS") {
            self.poll.timeout = Duration::from_millis(ms);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base url: {}", e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "base url must use http or https",
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(self.base_url.clone()),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::configuration_with_context(
                "retry.max_attempts must be at least 1",
                ErrorContext::new().with_field_path("config.retry.max_attempts"),
            ));
        }
        if self.poll.interval.is_zero() {
            return Err(Error::configuration_with_context(
                "poll.interval_ms must be greater than zero",
                ErrorContext::new().with_field_path("config.poll.interval_ms"),
            ));
        }
        Ok(())
    }
}
