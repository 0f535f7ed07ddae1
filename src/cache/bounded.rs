//! Capacity-bounded LRU cache shared across concurrent callers.

use std::{borrow::Borrow, hash::Hash, num::NonZeroUsize, sync::Mutex};

use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, info};

use crate::util::lock::mutex_lock;

use super::keys::CacheKey;

const SOURCE: &str = "cache::bounded";
const DEFAULT_NAME: &str = "default";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid cache argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Fixed-capacity cache with least-recently-used eviction.
///
/// Recency is tracked in access order: a successful [`get`](Self::get) promotes
/// the entry exactly like a [`put`](Self::put) does. One mutex guards both the
/// map and the recency list, so every operation observes a consistent ordering.
/// Values are handed out as clones; store `Arc<T>` when cloning `T` is costly.
pub struct BoundedCache<K, V> {
    name: &'static str,
    capacity: NonZeroUsize,
    entries: Mutex<LruCache<K, V>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: CacheKey,
    V: Clone,
{
    /// Create an unnamed cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::with_name(DEFAULT_NAME, capacity)
    }

    /// Create a cache whose metrics and logs are labelled with `name`.
    pub fn with_name(name: &'static str, capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| CacheError::invalid("cache capacity must be greater than zero"))?;

        Ok(Self {
            name,
            capacity,
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = mutex_lock(&self.entries, SOURCE, "get").get(key).cloned();

        if value.is_some() {
            counter!("quire_cache_hit_total", "cache" => self.name).increment(1);
            debug!(target = SOURCE, cache = self.name, "cache hit");
        } else {
            counter!("quire_cache_miss_total", "cache" => self.name).increment(1);
            debug!(target = SOURCE, cache = self.name, "cache miss");
        }

        value
    }

    /// Insert or replace `key`, marking it most recently used.
    ///
    /// Inserting a new key into a full cache evicts exactly one entry, the
    /// least recently used one. Replacing an existing key never evicts.
    pub fn put(&self, key: K, value: V) -> Result<(), CacheError> {
        if key.is_blank() {
            return Err(CacheError::invalid("cache key must not be blank"));
        }

        let evicted = {
            let mut entries = mutex_lock(&self.entries, SOURCE, "put");
            match entries.push(key.clone(), value) {
                Some((previous, _)) if previous != key => Some(previous),
                _ => None,
            }
        };

        if evicted.is_some() {
            counter!("quire_cache_evict_total", "cache" => self.name).increment(1);
            info!(
                target = SOURCE,
                cache = self.name,
                capacity = self.capacity.get(),
                "evicted least recently used entry"
            );
        }
        debug!(target = SOURCE, cache = self.name, "cache store");

        Ok(())
    }

    /// Current number of cached entries; never exceeds [`capacity`](Self::capacity).
    pub fn size(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "size").len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<K, V> std::fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
