use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};

/// Errors from the key-value cache backend.
#[derive(Debug)]
pub enum CacheError {
    Backend(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(msg) => write!(f, "cache backend error: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Expiring key-value store used for short-lived state (OTP codes and
/// attempt counters).
///
/// Handlers take this as a trait object so tests can substitute
/// [`InMemoryCache`] for a live Redis connection.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Store `value` under `key`, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch the value for `key`, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically increment the integer at `key` and return the new value.
    /// `ttl` is applied only when the increment creates the key.
    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    /// Remaining time until `key` expires, if it exists with an expiry.
    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CacheError>;
}

/// Redis-backed cache using a multiplexed connection manager.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(2)
            .set_connection_timeout(Duration::from_secs(5));

        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let () = conn.del(key).await?;
        Ok(())
    }

    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.incr(key, 1).await?;
        if count == 1 {
            let () = conn.expire(key, ttl.as_secs() as i64).await?;
        }
        Ok(count)
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let mut conn = self.conn.clone();
        // TTL returns -2 for a missing key and -1 for a key with no expiry.
        let secs: i64 = conn.ttl(key).await?;
        if secs > 0 {
            Ok(Some(Duration::from_secs(secs as u64)))
        } else {
            Ok(None)
        }
    }
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process cache with the same expiry semantics as Redis.
///
/// Used by the test suites and usable as a single-node fallback when no
/// Redis URL is configured.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_value(entries: &mut HashMap<String, MemoryEntry>, key: &str) -> Option<String> {
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>> {
        // Lock poisoning only happens if a holder panicked; the map itself
        // is still coherent for cache purposes.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl KeyValueCache for InMemoryCache {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.lock().insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock();
        Ok(Self::live_value(&mut entries, key))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock().remove(key);
        Ok(())
    }

    async fn increment_with_ttl(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut entries = self.lock();
        let current = match Self::live_value(&mut entries, key) {
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| CacheError::Backend(format!("non-integer value at {key}")))?,
            None => 0,
        };
        let next = current + 1;

        let expires_at = match entries.get(key) {
            Some(entry) => entry.expires_at,
            None => Instant::now() + ttl,
        };
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let mut entries = self.lock();
        if Self::live_value(&mut entries, key).is_none() {
            return Ok(None);
        }
        let entry = &entries[key];
        Ok(Some(entry.expires_at.saturating_duration_since(Instant::now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_roundtrip() {
        let cache = InMemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn expired_keys_are_gone() {
        let cache = InMemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.remaining_ttl("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let cache = InMemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn increment_counts_up_and_keeps_original_expiry() {
        let cache = InMemoryCache::new();
        assert_eq!(
            cache
                .increment_with_ttl("n", Duration::from_secs(60))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            cache
                .increment_with_ttl("n", Duration::from_secs(60))
                .await
                .unwrap(),
            2
        );
        assert_eq!(cache.get("n").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn increment_restarts_after_expiry() {
        let cache = InMemoryCache::new();
        cache
            .increment_with_ttl("n", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(
            cache
                .increment_with_ttl("n", Duration::from_secs(60))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn remaining_ttl_shrinks() {
        let cache = InMemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        let ttl = cache.remaining_ttl("k").await.unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(60));
        assert!(ttl > Duration::from_secs(58));
    }
}
