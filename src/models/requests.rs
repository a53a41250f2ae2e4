//! Request DTOs for the cache admin API

use serde::Deserialize;
use serde_json::Value;

use crate::cache::METADATA_PREFIX;

/// Request body for `PUT /entries`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// Any JSON value
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.starts_with(METADATA_PREFIX) {
            return Some(format!(
                "Keys starting with '{}' are reserved",
                METADATA_PREFIX
            ));
        }
        None
    }
}
