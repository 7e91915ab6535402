//! # Cache
//!
//! Small key/value store with expiry, backing the book list page cache.
//! The Redis connection is shared with the throttle.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cache Backends                                       │
//! │                                                                         │
//! │  REDIS_URL unset ──► memory backend (per process, bounded LRU)        │
//! │  REDIS_URL set   ──► redis backend  (shared by every API instance)    │
//! │                                                                         │
//! │  Memory: at most `capacity` entries; the least recently used entry     │
//! │  is evicted first, an expired entry is dropped when read.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

/// Entries kept by the memory backend unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 300;

/// Cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Clone)]
enum Backend {
    Memory(Arc<Mutex<LruCache<String, Entry>>>),
    Redis(ConnectionManager),
}

/// Key/value cache with per-entry expiry. Cheap to clone.
#[derive(Clone)]
pub struct Cache {
    backend: Backend,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("backend", &self.backend_name()).finish()
    }
}

impl Cache {
    /// In-process cache holding [`DEFAULT_CAPACITY`] entries.
    pub fn memory() -> Self {
        Cache::memory_with_capacity(DEFAULT_CAPACITY)
    }

    /// In-process cache holding at most `capacity` entries (minimum 1).
    pub fn memory_with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Cache {
            backend: Backend::Memory(Arc::new(Mutex::new(LruCache::new(capacity)))),
        }
    }

    /// Redis-backed cache. Fails if the server can't be reached.
    pub async fn redis(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        info!("Connected to Redis");
        Ok(Cache {
            backend: Backend::Redis(manager),
        })
    }

    /// Name of the active backend, for logs and health output.
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory(_) => "memory",
            Backend::Redis(_) => "redis",
        }
    }

    /// The Redis connection, when the cache is shared between instances.
    pub(crate) fn redis_connection(&self) -> Option<ConnectionManager> {
        match &self.backend {
            Backend::Memory(_) => None,
            Backend::Redis(manager) => Some(manager.clone()),
        }
    }

    /// Entries held in process. Always 0 for Redis.
    pub fn len(&self) -> usize {
        match &self.backend {
            Backend::Memory(entries) => entries.lock().len(),
            Backend::Redis(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets a live value.
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match &self.backend {
            Backend::Memory(entries) => {
                let mut entries = entries.lock();
                let live = match entries.get(key) {
                    Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
                    Some(_) => None,
                    None => return Ok(None),
                };
                if live.is_none() {
                    entries.pop(key);
                }
                Ok(live)
            }
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                let value: Option<String> = conn.get(key).await?;
                Ok(value)
            }
        }
    }

    /// Stores a value for `ttl`.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match &self.backend {
            Backend::Memory(entries) => {
                entries.lock().put(
                    key.to_string(),
                    Entry {
                        value: value.to_string(),
                        expires_at: Instant::now() + ttl,
                    },
                );
                Ok(())
            }
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
                Ok(())
            }
        }
    }

    /// Checks the backend is reachable.
    pub async fn ping(&self) -> bool {
        match &self.backend {
            Backend::Memory(_) => true,
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                redis::cmd("PING")
                    .query_async::<String>(&mut conn)
                    .await
                    .is_ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_set_get() {
        let cache = Cache::memory();
        cache.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_entries_expire() {
        let cache = Cache::memory();
        cache.set("k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_memory_is_bounded() {
        let cache = Cache::memory_with_capacity(100);
        for i in 0..5_000 {
            cache
                .set(&format!("books:/api/books/?page={i}"), "{}", Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.set("fresh", "v", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.len(), 100);
        assert_eq!(cache.get("fresh").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_least_recently_used_goes_first() {
        let cache = Cache::memory_with_capacity(2);
        let ttl = Duration::from_secs(60);
        cache.set("a", "1", ttl).await.unwrap();
        cache.set("b", "2", ttl).await.unwrap();
        cache.get("a").await.unwrap();
        cache.set("c", "3", ttl).await.unwrap();

        assert!(cache.get("a").await.unwrap().is_some());
        assert!(cache.get("b").await.unwrap().is_none());
        assert!(cache.get("c").await.unwrap().is_some());
    }
}
