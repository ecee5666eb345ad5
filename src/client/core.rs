use crate::cache::{CacheStats, ResponseCache};
use crate::config::ClientConfig;
use crate::events::{EventBus, EventObserver, RequestScope, SubscriptionId};
use crate::jobs::JobPoller;
use crate::resilience::{InFlightRegistry, RetryPolicy};
use crate::transport::{Endpoint, Payload, Transport, TransportRequest};
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Voice service client.
///
/// Owns its cache, in-flight registry, and event bus; two clients never
/// share orchestration state. Cheap to share behind an `Arc`.
pub struct VoiceClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) cache: Arc<ResponseCache>,
    pub(crate) inflight: Arc<InFlightRegistry<Payload>>,
    pub(crate) retry: RetryPolicy,
    pub(crate) poller: JobPoller,
    pub(crate) events: Arc<EventBus>,
}

impl VoiceClient {
    /// Client for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        crate::client::builder::VoiceClientBuilder::new()
            .base_url(base_url)
            .build()
    }

    pub fn builder() -> crate::client::builder::VoiceClientBuilder {
        crate::client::builder::VoiceClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) -> SubscriptionId {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of distinct requests currently on the wire.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Safe read served from the cache when fresh, else via [`fetch`](Self::fetch).
    pub(crate) async fn cached_read(
        &self,
        endpoint: Endpoint,
        scope: &RequestScope,
    ) -> Result<Payload> {
        if endpoint.is_cacheable() {
            if let Some(hit) = self.cache.get(&endpoint.request_key()) {
                debug!(endpoint = endpoint.operation(), "served from cache");
                scope.cache_hit();
                return Ok(hit);
            }
        }
        self.fetch(endpoint).await
    }

    /// Safe read that skips the cache lookup. Concurrent identical reads share
    /// one retried transport call, and a cacheable result refreshes the entry
    /// unless the key was invalidated while the call was on the wire.
    pub(crate) async fn fetch(&self, endpoint: Endpoint) -> Result<Payload> {
        debug_assert!(endpoint.is_safe());
        let key = endpoint.request_key();
        let store_key = key.clone();
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);
        let retry = self.retry.clone();

        self.inflight
            .dedupe(key, move || {
                let epoch = cache.epoch(&store_key);
                async move {
                    let started = Instant::now();
                    let outcome = retry
                        .execute(|| transport.send(TransportRequest::new(endpoint.clone())))
                        .await;
                    debug!(
                        endpoint = endpoint.operation(),
                        ok = outcome.is_ok(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "read settled"
                    );
                    if endpoint.is_cacheable() {
                        if let Ok(payload) = &outcome {
                            if !cache.set_if_current(store_key, payload.clone(), epoch) {
                                debug!(
                                    endpoint = endpoint.operation(),
                                    "stale read not cached"
                                );
                            }
                        }
                    }
                    outcome
                }
            })
            .await
    }

    /// Mutating call: one transport attempt, never cached or shared.
    pub(crate) async fn mutate(&self, request: TransportRequest) -> Result<Payload> {
        debug_assert!(!request.endpoint.is_safe());
        self.transport.send(request).await
    }

    /// Drop cached reads a mutation may have made stale. Reads already on the
    /// wire keep serving their current waiters but are detached, so later
    /// callers go back to the server.
    pub(crate) fn invalidate(&self, endpoints: &[Endpoint]) {
        for endpoint in endpoints {
            let key = endpoint.request_key();
            if self.cache.invalidate(&key) {
                debug!(endpoint = endpoint.operation(), "cache entry invalidated");
            }
            if self.inflight.forget(&key) {
                debug!(endpoint = endpoint.operation(), "in-flight read detached");
            }
        }
    }
}

impl std::fmt::Debug for VoiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceClient")
            .field("base_url", &self.config.base_url)
            .field("cached", &self.cache.len())
            .field("in_flight", &self.inflight.len())
            .finish()
    }
}
