use std::fmt;
use std::time::{Duration, Instant};

use lru_time_cache::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::cache_key::CacheKey;
use crate::utils::constants::DEFAULT_CACHE_CAPACITY;

/// Token value plus the moment it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    token: String,
    inserted_at: Instant,
}

impl CacheEntry {
    fn new(token: String) -> Self {
        Self {
            token,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Bounded, time-expiring token cache: key -> token.
///
/// Capacity eviction drops the least recently used entry (reads and writes
/// both count as use). Expiry is measured from insertion and checked lazily
/// on read. A zero ttl disables caching entirely.
pub struct TokenCache {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            inner: Mutex::new(LruCache::with_capacity(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Get token if it exists and is not expired
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let mut map = self.inner.lock();
        Self::lookup(&mut map, key, self.ttl)
    }

    /// Insert or overwrite the token stored under `key`
    pub fn put(&self, key: CacheKey, token: String) {
        if !self.is_enabled() {
            return;
        }
        let mut map = self.inner.lock();
        map.insert(key, CacheEntry::new(token));
    }

    /// Returns the cached token for `key`, or runs `issue` and stores its result.
    ///
    /// The lock is held for the whole check-issue-store sequence, so
    /// concurrent callers asking for the same key observe the first caller's
    /// token instead of issuing their own. There is one lock per cache, not
    /// per key: while `issue` runs, callers for every other key wait too, so
    /// a slow issuer stalls all token requests of this cache. Errors from
    /// `issue` are returned as-is and nothing is stored.
    pub fn get_or_try_insert_with<E, F>(&self, key: CacheKey, issue: F) -> Result<String, E>
    where
        F: FnOnce(&CacheKey) -> Result<String, E>,
    {
        if !self.is_enabled() {
            trace!(key = %key, "token cache disabled");
            return issue(&key);
        }

        let mut map = self.inner.lock();
        if let Some(token) = Self::lookup(&mut map, &key, self.ttl) {
            debug!(key = %key, "token cache hit");
            return Ok(token);
        }

        debug!(key = %key, "token cache miss");
        let token = issue(&key)?;
        map.insert(key, CacheEntry::new(token.clone()));
        Ok(token)
    }

    /// Number of stored entries, expired ones included until they are read
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    fn lookup(
        map: &mut LruCache<CacheKey, CacheEntry>,
        key: &CacheKey,
        ttl: Duration,
    ) -> Option<String> {
        let expired = match map.get(key) {
            Some(entry) if !entry.is_expired(ttl) => return Some(entry.token.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            trace!(key = %key, "dropping expired token");
            map.remove(key);
        }
        None
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .field("inner", &"LruCache<CacheKey, CacheEntry>")
            .finish()
    }
}
