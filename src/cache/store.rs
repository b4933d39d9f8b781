//! LRU response store with a freshness window.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};
use super::{METRIC_CACHE_EVICT, METRIC_CACHE_HIT, METRIC_CACHE_MISS};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: Instant,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        ttl.is_none_or(|ttl| self.stored_at.elapsed() < ttl)
    }
}

/// Outcome of a store lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Fresh(CachedResponse),
    /// An entry existed but outlived the TTL; it has been dropped.
    Expired,
    Absent,
}

impl Lookup {
    pub fn into_fresh(self) -> Option<CachedResponse> {
        match self {
            Lookup::Fresh(cached) => Some(cached),
            Lookup::Expired | Lookup::Absent => None,
        }
    }
}

pub struct ResponseStore {
    responses: RwLock<LruCache<CacheKey, CachedResponse>>,
    ttl: Option<Duration>,
}

impl ResponseStore {
    pub fn new(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            responses: RwLock::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.response_limit_non_zero(), config.ttl())
    }

    /// Fresh entry for `key`; stale entries are dropped and count as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        self.lookup(key).into_fresh()
    }

    pub fn lookup(&self, key: &CacheKey) -> Lookup {
        let mut responses = rw_write(&self.responses, SOURCE, "lookup");
        match responses.get(key) {
            Some(cached) if cached.is_fresh(self.ttl) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Lookup::Fresh(cached.clone())
            }
            Some(_) => {
                responses.pop(key);
                counter!(METRIC_CACHE_MISS, "reason" => "expired").increment(1);
                Lookup::Expired
            }
            None => {
                counter!(METRIC_CACHE_MISS, "reason" => "absent").increment(1);
                Lookup::Absent
            }
        }
    }

    /// Store a response; returns the key pushed out to make room, if any.
    pub fn insert(&self, key: CacheKey, response: CachedResponse) -> Option<CacheKey> {
        let evicted = rw_write(&self.responses, SOURCE, "insert")
            .push(key.clone(), response)
            .map(|(evicted, _)| evicted)
            .filter(|evicted| *evicted != key);
        if evicted.is_some() {
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
        evicted
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        rw_write(&self.responses, SOURCE, "remove").pop(key).is_some()
    }

    /// Keys cached for `path` under any query string.
    pub fn keys_for_path(&self, path: &str) -> Vec<CacheKey> {
        rw_read(&self.responses, SOURCE, "keys_for_path")
            .iter()
            .filter(|(key, _)| key.path == path)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn clear(&self) {
        rw_write(&self.responses, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.responses, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
