//! Cache Module
//!
//! Two-tier caching: a bounded FIFO memory tier over a persistent key/value
//! store, with per-entry TTL and lazy expiry.

mod clock;
mod disk;
mod entry;
mod keys;
mod memory;
mod service;
mod stats;
mod ttl;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use disk::{DiskStore, FileStore, MemoryStore};
pub use entry::CacheEntry;
pub use keys::{CacheKeys, SEARCH_QUERY_MAX_CHARS};
pub use memory::MemoryTier;
pub use service::{CacheService, SetOptions, METADATA_PREFIX, USER_SHARED_PREFIXES};
pub use stats::CacheStats;
pub use ttl::{CacheCategory, CacheTtl};
