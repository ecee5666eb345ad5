use crate::cache::{CacheConfig, ResponseCache};
use crate::client::core::VoiceClient;
use crate::config::ClientConfig;
use crate::events::{EventBus, EventObserver};
use crate::jobs::{JobPoller, PollConfig};
use crate::resilience::{InFlightRegistry, RetryConfig, RetryPolicy};
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for [`VoiceClient`].
///
/// Starts from [`ClientConfig::default`]; later calls override earlier ones.
pub struct VoiceClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    observers: Vec<Arc<dyn EventObserver>>,
}

impl VoiceClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
            observers: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply `VOICECLONE_*` environment overrides on top of the current configuration.
    pub fn from_env(mut self) -> Self {
        self.config = self.config.with_env_overrides();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn cache_max_age(mut self, max_age: Duration) -> Self {
        self.config.cache.max_age = max_age;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn poll(mut self, poll: PollConfig) -> Self {
        self.config.poll = poll;
        self
    }

    /// Use a custom transport instead of HTTP (test doubles, alternate stacks).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Subscribe an observer before the first call is made.
    pub fn observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> Result<VoiceClient> {
        let mut config = self.config;
        config.base_url = config.base_url.trim().trim_end_matches('/').to_string();
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config)?),
        };

        let events = Arc::new(EventBus::new());
        for observer in self.observers {
            events.subscribe(observer);
        }

        debug!(
            base_url = config.base_url.as_str(),
            cache_max_age_ms = config.cache.max_age.as_millis() as u64,
            retry_attempts = config.retry.max_attempts,
            poll_interval_ms = config.poll.interval.as_millis() as u64,
            "voice client built"
        );

        Ok(VoiceClient {
            transport,
            cache: Arc::new(ResponseCache::new(config.cache.clone())),
            inflight: Arc::new(InFlightRegistry::new()),
            retry: RetryPolicy::new(config.retry.clone()),
            poller: JobPoller::new(config.poll.clone()),
            events,
            config,
        })
    }
}

impl Default for VoiceClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
