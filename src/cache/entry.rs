//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single cached value with its creation and expiry timestamps.
///
/// Persisted as `{"data": ..., "createdAt": ..., "expiresAt": ...}`.
/// Entries are never mutated in place; updates replace the entry wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The stored value
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_seconds` after `now_ms`.
    ///
    /// A zero TTL is raised to one second so `expires_at > created_at` holds.
    pub fn new(data: T, ttl_seconds: u64, now_ms: u64) -> Self {
        let ttl_ms = ttl_seconds.max(1).saturating_mul(1000);

        Self {
            data,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Validity ==
    /// An entry is valid iff `now < expires_at`.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at
    }

    /// True once `now >= expires_at`; the complement of [`is_valid_at`](Self::is_valid_at).
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        !self.is_valid_at(now_ms)
    }

    /// Strictly past expiry. Prune passes use this test.
    pub fn is_past_expiry(&self, now_ms: u64) -> bool {
        self.expires_at < now_ms
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}
