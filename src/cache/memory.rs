//! Memory Tier Module
//!
//! Bounded, insertion-ordered map used as the fast tier of the cache.
//!
//! Eviction is strict FIFO: when full, the earliest-inserted key goes first.
//! Reads never reorder keys, and overwriting a key keeps its original slot.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use crate::cache::CacheEntry;

// == Memory Tier ==
#[derive(Debug, Default)]
pub struct MemoryTier {
    /// Stored entries, type-erased to JSON
    entries: HashMap<String, CacheEntry<Value>>,
    /// Keys in insertion order (front = oldest)
    order: VecDeque<String>,
    /// Maximum number of entries; zero disables the tier
    capacity: usize,
}

impl MemoryTier {
    // == Constructor ==
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    // == Insert ==
    /// Stores an entry, returning the key evicted to make room, if any.
    pub fn insert(&mut self, key: &str, entry: CacheEntry<Value>) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(slot) = self.entries.get_mut(key) {
            *slot = entry;
            return None;
        }

        let mut evicted = None;
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.order.push_back(key.to_string());
        self.entries.insert(key.to_string(), entry);
        evicted
    }

    // == Get ==
    pub fn get(&self, key: &str) -> Option<&CacheEntry<Value>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<Value>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    // == Remove Expired ==
    /// Drops every entry strictly past expiry and returns their keys.
    pub fn remove_expired(&mut self, now_ms: u64) -> Vec<String> {
        let expired: Vec<String> = self
            .order
            .iter()
            .filter(|key| {
                self.entries
                    .get(key.as_str())
                    .is_some_and(|entry| entry.is_past_expiry(now_ms))
            })
            .cloned()
            .collect();

        for key in &expired {
            self.entries.remove(key);
        }
        self.order.retain(|k| self.entries.contains_key(k));

        expired
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
