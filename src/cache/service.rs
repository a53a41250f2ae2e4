//! Cache Service Module
//!
//! Two-tier cache: a bounded FIFO memory tier in front of a persistent
//! [`DiskStore`]. Reads check memory, then disk, and promote disk hits into
//! memory. Writes go to both tiers.
//!
//! Every operation is best-effort. Storage and (de)serialization failures are
//! logged and treated as misses or no-ops; none of them reach the caller.
//! The only error a caller can observe is its own fetcher's, from
//! [`CacheService::get_or_fetch`].

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheCategory, CacheEntry, CacheKeys, CacheStats, Clock, DiskStore, FileStore, MemoryTier,
    SystemClock,
};
use crate::config::Config;
use crate::error::Result;

/// Keys with this prefix belong to whoever shares the store; the cache never
/// prunes, lists or prefix-deletes them.
pub const METADATA_PREFIX: &str = "__";

/// Global prefixes cleared by [`CacheService::invalidate_user_cache`] in
/// addition to the user's own `user:{id}` prefix.
pub const USER_SHARED_PREFIXES: [&str; 3] = ["profile:", "goals:", "intake:"];

// == Set Options ==
/// Per-write options for [`CacheService::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// TTL in seconds; the service default applies when `None`
    pub ttl_seconds: Option<u64>,
}

impl SetOptions {
    pub fn ttl(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds: Some(ttl_seconds),
        }
    }
}

impl From<CacheCategory> for SetOptions {
    fn from(category: CacheCategory) -> Self {
        Self::ttl(category.ttl_seconds())
    }
}

// == Tier State ==
struct Tiers {
    memory: MemoryTier,
    store: Box<dyn DiskStore>,
    stats: CacheStats,
}

impl Tiers {
    /// Memory first, then disk. Expired or unreadable disk entries are
    /// removed from both tiers; valid ones are promoted into memory.
    fn read(&mut self, key: &str, now_ms: u64) -> Option<Value> {
        if let Some(entry) = self.memory.get(key) {
            if entry.is_valid_at(now_ms) {
                debug!("Memory hit: {}", key);
                return Some(entry.data.clone());
            }
            self.memory.remove(key);
        }

        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Disk read failed for {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry<Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Dropping unreadable entry {}: {}", key, e);
                self.remove(key);
                return None;
            }
        };

        if entry.is_expired_at(now_ms) {
            debug!("Entry expired on read: {}", key);
            self.remove(key);
            return None;
        }

        debug!("Disk hit, promoting: {}", key);
        let data = entry.data.clone();
        self.insert_memory(key, entry);
        Some(data)
    }

    fn insert_memory(&mut self, key: &str, entry: CacheEntry<Value>) {
        if let Some(evicted) = self.memory.insert(key, entry) {
            self.stats.record_eviction();
            debug!("Evicted {} from memory tier", evicted);
        }
    }

    fn remove(&mut self, key: &str) {
        self.memory.remove(key);
        if let Err(e) = self.store.remove(key) {
            warn!("Disk delete failed for {}: {}", key, e);
        }
    }

    /// Drops `keys` from memory, then from disk in one batch.
    fn remove_many(&mut self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        for key in keys {
            self.memory.remove(key);
        }
        if let Err(e) = self.store.remove_many(keys) {
            warn!("Disk batch delete of {} keys failed: {}", keys.len(), e);
        }
    }

    /// Non-metadata keys of the disk tier.
    fn disk_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| !k.starts_with(METADATA_PREFIX))
                .collect(),
            Err(e) => {
                warn!("Disk key listing failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Sorted union of both tiers' non-metadata keys.
    fn all_keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.disk_keys().into_iter().collect();
        keys.extend(
            self.memory
                .keys()
                .filter(|k| !k.starts_with(METADATA_PREFIX))
                .cloned(),
        );
        keys
    }
}

// == Cache Service ==
/// Process-local two-tier cache.
///
/// `Send + Sync`: share it behind an `Arc`. Each operation holds the internal
/// lock for its whole duration, except [`get_or_fetch`](Self::get_or_fetch)
/// which releases it while the fetcher runs.
pub struct CacheService {
    tiers: Mutex<Tiers>,
    clock: Arc<dyn Clock>,
    default_ttl: u64,
}

impl CacheService {
    // == Lifecycle ==
    /// Opens the file store described by `config` and builds a cache over it.
    pub fn init(config: &Config) -> Result<Self> {
        let store = FileStore::open(&config.cache_dir, &config.namespace)?;
        info!(
            "Cache initialized: memory_capacity={}, default_ttl={}s, store={}",
            config.max_memory_entries,
            config.default_ttl,
            store.path().display()
        );
        Ok(Self::new(config.max_memory_entries, config.default_ttl, store))
    }

    /// Builds a cache over an arbitrary store, using wall-clock time.
    pub fn new(max_memory_entries: usize, default_ttl: u64, store: impl DiskStore + 'static) -> Self {
        Self::with_clock(max_memory_entries, default_ttl, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        max_memory_entries: usize,
        default_ttl: u64,
        store: impl DiskStore + 'static,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tiers: Mutex::new(Tiers {
                memory: MemoryTier::new(max_memory_entries),
                store: Box::new(store),
                stats: CacheStats::new(),
            }),
            clock,
            default_ttl,
        }
    }

    /// Flushes the store and drops the memory tier. The service stays usable
    /// afterwards; reads simply start from disk again.
    pub fn dispose(&self) {
        let mut tiers = self.lock();
        if let Err(e) = tiers.store.flush() {
            warn!("Cache flush failed on dispose: {}", e);
        }
        tiers.memory.clear();
        info!("Cache disposed");
    }

    fn lock(&self) -> MutexGuard<'_, Tiers> {
        // Tier state is valid between operations even if a holder panicked
        self.tiers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Get ==
    /// Returns the cached value for `key`, or `None` on a miss.
    ///
    /// A value that cannot be converted into `T` is reported as a miss but
    /// left in place.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        let mut tiers = self.lock();

        let decoded = tiers
            .read(key, now)
            .and_then(|value| match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!("Cached value for {} has unexpected shape: {}", key, e);
                    None
                }
            });

        match decoded {
            Some(_) => tiers.stats.record_hit(),
            None => tiers.stats.record_miss(),
        }
        decoded
    }

    // == Set ==
    /// Stores `data` under `key` in both tiers, replacing any prior entry.
    ///
    /// A failed disk write leaves a memory-only entry.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, data: &T, options: SetOptions) {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cannot serialize value for {}: {}", key, e);
                return;
            }
        };

        let ttl = options.ttl_seconds.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(data, ttl, self.clock.now_ms());

        let mut tiers = self.lock();
        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = tiers.store.set(key, raw) {
                    warn!("Disk write failed for {}, keeping memory copy only: {}", key, e);
                }
            }
            Err(e) => warn!("Cannot encode entry for {}: {}", key, e),
        }
        tiers.insert_memory(key, entry);
        debug!("Cached {} for {}s", key, ttl);
    }

    // == Get Or Fetch ==
    /// Returns the cached value, or runs `fetcher` once on a miss and caches
    /// its result.
    ///
    /// Concurrent misses on the same key each run their own fetcher; the last
    /// write wins. Fetcher errors are returned unchanged and nothing is cached.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        options: SetOptions,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get(key) {
            return Ok(cached);
        }

        debug!("Fetching {} after cache miss", key);
        let fresh = fetcher().await?;
        self.set(key, &fresh, options);
        Ok(fresh)
    }

    // == Delete ==
    /// Removes `key` from both tiers. Idempotent.
    pub fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Deletes every key starting with `prefix` and returns how many matched.
    ///
    /// Linear scan over all stored keys.
    pub fn delete_by_prefix(&self, prefix: &str) -> usize {
        let mut tiers = self.lock();
        let matching: Vec<String> = tiers
            .all_keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();

        tiers.remove_many(&matching);

        if !matching.is_empty() {
            debug!("Deleted {} keys with prefix '{}'", matching.len(), prefix);
        }
        matching.len()
    }

    /// Drops `user:{id}*` plus the global `profile:`, `goals:` and `intake:`
    /// prefixes. The latter three are not scoped to the user: they clear
    /// those categories for everyone.
    pub fn invalidate_user_cache(&self, user_id: &str) -> usize {
        let own = self.delete_by_prefix(&CacheKeys::user_prefix(user_id));
        let shared: usize = USER_SHARED_PREFIXES
            .iter()
            .map(|prefix| self.delete_by_prefix(prefix))
            .sum();

        info!("Invalidated cache for user {}: {} keys", user_id, own + shared);
        own + shared
    }

    // == Prune Expired ==
    /// Removes every entry strictly past expiry, plus unreadable disk
    /// entries. Returns the number of distinct keys removed.
    ///
    /// Not self-scheduling; see [`crate::tasks::spawn_prune_task`].
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut tiers = self.lock();

        let mut removed: BTreeSet<String> = tiers.memory.remove_expired(now).into_iter().collect();

        let stale: Vec<String> = tiers
            .disk_keys()
            .into_iter()
            .filter(|key| match tiers.store.get(key) {
                Ok(Some(raw)) => match serde_json::from_str::<CacheEntry<Value>>(&raw) {
                    Ok(entry) => entry.is_past_expiry(now),
                    Err(_) => true,
                },
                Ok(None) => false,
                Err(e) => {
                    warn!("Disk read failed for {} during prune: {}", key, e);
                    false
                }
            })
            .collect();

        tiers.remove_many(&stale);
        removed.extend(stale);

        removed.len()
    }

    // == Clear All ==
    pub fn clear_all(&self) {
        let mut tiers = self.lock();
        tiers.memory.clear();
        if let Err(e) = tiers.store.clear() {
            warn!("Disk clear failed: {}", e);
        }
        info!("Cache cleared");
    }

    // == Stats ==
    /// Snapshot of tier sizes, keys and counters.
    pub fn get_stats(&self) -> CacheStats {
        let tiers = self.lock();
        CacheStats {
            memory_size: tiers.memory.len(),
            disk_size: tiers.disk_keys().len(),
            keys: tiers.all_keys().into_iter().collect(),
            ..tiers.stats.clone()
        }
    }

    /// Memory-only lookup; never touches disk or the counters.
    pub fn contains_in_memory(&self, key: &str) -> bool {
        self.lock().memory.contains(key)
    }
}
