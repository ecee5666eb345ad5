//! In-flight request sharing.
//!
//! Concurrent callers asking for the same [`RequestKey`] await one shared
//! outcome instead of issuing parallel transport calls.

use crate::cache::RequestKey;
use crate::Result;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type Pending<T> = Shared<BoxFuture<'static, Result<T>>>;

struct Slot<T> {
    generation: u64,
    pending: WeakShared<BoxFuture<'static, Result<T>>>,
}

type Slots<T> = Arc<Mutex<HashMap<RequestKey, Slot<T>>>>;

fn lock<T>(slots: &Slots<T>) -> MutexGuard<'_, HashMap<RequestKey, Slot<T>>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registry of pending outcomes, keyed by request.
///
/// - At most one producer runs per key at a time.
/// - Every waiter observes the same success value or the same error.
/// - A registration is removed exactly once, when its producer settles or
///   when it is [forgotten](Self::forget).
/// - If every waiter is dropped before settlement the registration goes stale
///   and the next caller starts a fresh producer.
pub struct InFlightRegistry<T> {
    slots: Slots<T>,
    next_generation: AtomicU64,
}

impl<T> InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub async fn dedupe<F, Fut>(&self, key: RequestKey, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let pending = self.join_or_register(key, producer);
        pending.await
    }

    fn join_or_register<F, Fut>(&self, key: RequestKey, producer: F) -> Pending<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slots = lock(&self.slots);
        if let Some(existing) = slots.get(&key).and_then(|slot| slot.pending.upgrade()) {
            debug!(key = %key, "joining in-flight request");
            return existing;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.slots);
        let settle_key = key.clone();
        let work = producer();
        let pending: Pending<T> = async move {
            let outcome = work.await;
            let mut slots = lock(&registry);
            if slots.get(&settle_key).map(|s| s.generation) == Some(generation) {
                slots.remove(&settle_key);
            }
            outcome
        }
        .boxed()
        .shared();

        if let Some(weak) = pending.downgrade() {
            slots.insert(
                key,
                Slot {
                    generation,
                    pending: weak,
                },
            );
        }
        pending
    }

    /// Detach the pending outcome for `key`. Current waiters still receive it,
    /// the next caller starts a fresh producer. Returns whether a live slot
    /// was detached.
    pub fn forget(&self, key: &RequestKey) -> bool {
        lock(&self.slots)
            .remove(key)
            .map(|slot| slot.pending.upgrade().is_some())
            .unwrap_or(false)
    }

    /// Number of keys with a live pending outcome.
    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| slot.pending.upgrade().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        lock(&self.slots)
            .get(key)
            .map(|slot| slot.pending.upgrade().is_some())
            .unwrap_or(false)
    }
}

impl<T> Default for InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpMethod, TransportError};
    use crate::Error;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn key(path: &str) -> RequestKey {
        RequestKey::new(HttpMethod::Get, path)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_producer() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(7)
            }
        };

        let (a, b, c) = tokio::join!(
            registry.dedupe(key("/api/voices"), make(Arc::clone(&calls))),
            registry.dedupe(key("/api/voices"), make(Arc::clone(&calls))),
            registry.dedupe(key("/api/voices"), make(Arc::clone(&calls))),
        );
        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (7, 7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_shared_and_does_not_poison_key() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<u32, _>(Error::Transport(TransportError::Connect("refused".into())))
            }
        };

        let (a, b) = tokio::join!(
            registry.dedupe(key("/api/health"), failing(Arc::clone(&calls))),
            registry.dedupe(key("/api/health"), failing(Arc::clone(&calls))),
        );
        assert!(matches!(a, Err(Error::Transport(_))));
        assert!(matches!(b, Err(Error::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!registry.contains(&key("/api/health")));

        let retry = registry
            .dedupe(key("/api/health"), || async { Ok(1) })
            .await
            .unwrap();
        assert_eq!(retry, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_run_independently() {
        let registry: InFlightRegistry<&'static str> = InFlightRegistry::new();
        let (a, b) = tokio::join!(
            registry.dedupe(key("/a"), || async { Ok("a") }),
            registry.dedupe(key("/b"), || async { Ok("b") }),
        );
        assert_eq!((a.unwrap(), b.unwrap()), ("a", "b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_registration_is_replaced() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();
        {
            let fut = registry.dedupe(key("/slow"), || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1)
            });
            let _ = tokio::time::timeout(Duration::from_millis(5), fut).await;
        }
        assert!(!registry.contains(&key("/slow")));
        let v = registry
            .dedupe(key("/slow"), || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forgotten_key_starts_fresh_producer() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();
        let first = registry.dedupe(key("/api/voices"), || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(1)
        });
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(registry.forget(&key("/api/voices")));
            assert!(!registry.forget(&key("/api/voices")));
            registry
                .dedupe(key("/api/voices"), || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(2)
                })
                .await
        };
        let (a, b) = tokio::join!(first, second);
        assert_eq!((a.unwrap(), b.unwrap()), (1, 2));
        assert!(registry.is_empty());
    }
}
