//! Response DTOs for the cache admin API

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for `GET /entries/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for `PUT /entries`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// TTL applied, in seconds
    pub ttl: u64,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, ttl: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' cached for {}s", key, ttl),
            key,
            ttl,
        }
    }
}

/// Response body for `DELETE /entries/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted", key),
            key,
        }
    }
}

/// Response body for bulk removals (prefix delete, user invalidation, prune)
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub message: String,
    pub removed: usize,
}

impl CountResponse {
    pub fn new(message: impl Into<String>, removed: usize) -> Self {
        Self {
            message: message.into(),
            removed,
        }
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("food:1", json!({"kcal": 120}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"key": "food:1", "value": {"kcal": 120}}));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("food:1", 3600);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("food:1"));
        assert!(json.contains("3600"));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("food:1");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_stats_response_flattens_stats() {
        let stats = CacheStats {
            memory_size: 2,
            disk_size: 3,
            keys: vec!["a".to_string()],
            hits: 3,
            misses: 1,
            evictions: 0,
        };
        let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();

        assert_eq!(json["memory_size"], 2);
        assert_eq!(json["disk_size"], 3);
        assert_eq!(json["keys"], json!(["a"]));
        assert_eq!(json["hit_rate"], 0.75);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(CacheStats::new());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
