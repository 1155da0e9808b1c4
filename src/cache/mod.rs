//! LRU slot cache in front of any [`StorageReader`].
//!
//! The resolver itself never caches. Callers that resolve the same contract
//! repeatedly (the CLI resolving several fields that share a packed word, a
//! service polling a layout) wrap their reader instead:
//!
//! ```text
//!   StorageResolver
//!     → CachedStorageReader   (this module, in-memory LRU)
//!       → GenesisStorageReader / MemoryStorage / RPC-backed reader
//! ```
//!
//! Errors are never cached; a failed read is retried on the next call.

use alloy_primitives::{Address, B256, U256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::constants::DEFAULT_CACHE_ENTRIES;
use crate::errors::ProviderError;
use crate::onchain::StorageReader;

/// A reference-counted, thread-safe handle to a [`SlotCache`].
pub type SharedCache = Arc<Mutex<SlotCache>>;

/// Configuration for the slot cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of `(address, slot) → word` entries held in RAM.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: DEFAULT_CACHE_ENTRIES }
    }
}

/// Snapshot of cache performance counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that went to the inner reader.
    pub misses: u64,
    /// Entries evicted to make room for new ones.
    pub evictions: u64,
    /// Current number of entries.
    pub current_entries: usize,
}

impl CacheStats {
    /// Cache hit rate in the range `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache mapping `(Address, slot) → B256`.
///
/// Front of `order` is least recently used, back is most recently used.
#[derive(Debug)]
pub struct SlotCache {
    map: HashMap<(Address, U256), B256>,
    order: VecDeque<(Address, U256)>,
    max_entries: usize,
    stats: CacheStats,
}

impl SlotCache {
    /// Create a cache holding at most `max_entries` words (at least one).
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            map: HashMap::with_capacity(max_entries),
            order: VecDeque::with_capacity(max_entries),
            max_entries,
            stats: CacheStats::default(),
        }
    }

    /// Look up a word, promoting it to most recently used on a hit.
    pub fn get(&mut self, address: Address, slot: U256) -> Option<B256> {
        let key = (address, slot);
        match self.map.get(&key).copied() {
            Some(value) => {
                self.stats.hits += 1;
                self.touch(key);
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a word, evicting the least recently used entry when full.
    pub fn insert(&mut self, address: Address, slot: U256, value: B256) {
        let key = (address, slot);
        if self.map.insert(key, value).is_some() {
            self.touch(key);
        } else {
            if self.map.len() > self.max_entries {
                if let Some(lru) = self.order.pop_front() {
                    self.map.remove(&lru);
                    self.stats.evictions += 1;
                }
            }
            self.order.push_back(key);
        }
        self.stats.current_entries = self.map.len();
    }

    /// Drop every cached word of one contract.
    pub fn invalidate_address(&mut self, address: Address) {
        self.map.retain(|(a, _), _| *a != address);
        self.order.retain(|(a, _)| *a != address);
        self.stats.current_entries = self.map.len();
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.stats.current_entries = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    fn touch(&mut self, key: (Address, U256)) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
            self.order.push_back(key);
        }
    }
}

/// A [`StorageReader`] wrapper that adds a thread-safe LRU cache in front of
/// any inner reader.
pub struct CachedStorageReader<R> {
    inner: R,
    cache: SharedCache,
}

impl<R: StorageReader> CachedStorageReader<R> {
    /// Wrap `inner` with a new, unshared cache.
    pub fn new(inner: R, config: CacheConfig) -> Self {
        Self { inner, cache: Arc::new(Mutex::new(SlotCache::new(config.max_entries))) }
    }

    /// Wrap `inner` with an existing shared cache.
    pub fn new_shared(inner: R, cache: SharedCache) -> Self {
        Self { inner, cache }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.lock().expect("cache lock poisoned").stats()
    }

    /// Invalidate all cached slots for the given contract address.
    pub fn invalidate_address(&self, address: Address) {
        self.cache.lock().expect("cache lock poisoned").invalidate_address(address);
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn shared_cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }
}

impl<R: StorageReader> StorageReader for CachedStorageReader<R> {
    fn read_storage(&self, address: Address, slot: U256) -> Result<B256, ProviderError> {
        if let Some(value) = self.cache.lock().expect("cache lock poisoned").get(address, slot) {
            return Ok(value);
        }
        let value = self.inner.read_storage(address, slot)?;
        self.cache.lock().expect("cache lock poisoned").insert(address, slot, value);
        Ok(value)
    }
}
