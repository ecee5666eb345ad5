//! 响应缓存模块：为安全的只读请求提供有时效的内存缓存。
//!
//! # Response Caching Module
//!
//! Safe reads (health, voice list, job status, analytics, previews) are kept
//! for `max_age` after they were fetched. Mutating calls are never cached.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Time-bounded store with lazy eviction and statistics |
//! | [`CacheConfig`] | `enabled` flag and `max_age` |
//! | [`RequestKey`] | Method + concrete path |
//!
//! ```rust
//! use voiceclone_client::cache::{CacheConfig, RequestKey, ResponseCache};
//! use voiceclone_client::transport::{HttpMethod, Payload};
//! use std::time::Duration;
//!
//! let cache = ResponseCache::new(CacheConfig::new().with_max_age(Duration::from_secs(60)));
//! let key = RequestKey::new(HttpMethod::Get, "/api/voices");
//! cache.set(key.clone(), Payload::Text("cached".into()));
//! assert!(cache.get(&key).is_some());
//! ```

mod key;
mod store;

pub use key::RequestKey;
pub use store::{CacheConfig, CacheStats, ResponseCache};
