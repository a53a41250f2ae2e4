//! Configuration Module
//!
//! Handles loading cache and admin server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries held in the memory tier
    pub max_memory_entries: usize,
    /// Default TTL in seconds for entries set without explicit TTL
    pub default_ttl: u64,
    /// Directory holding the persistent store
    pub cache_dir: PathBuf,
    /// Storage identifier the persistent store is namespaced under
    pub namespace: String,
    /// Admin HTTP server port
    pub server_port: u16,
    /// Interval in seconds between scheduled prune passes
    pub prune_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_MEMORY_ENTRIES` - Memory tier capacity (default: 100)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 600)
    /// - `CACHE_DIR` - Persistent store directory (default: `.cache`)
    /// - `CACHE_NAMESPACE` - Storage identifier (default: `app-cache`)
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    /// - `PRUNE_INTERVAL` - Prune frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_memory_entries: parse_var("MAX_MEMORY_ENTRIES").unwrap_or(defaults.max_memory_entries),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.namespace),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            prune_interval: parse_var("PRUNE_INTERVAL").unwrap_or(defaults.prune_interval),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_memory_entries: 100,
            default_ttl: 600,
            cache_dir: PathBuf::from(".cache"),
            namespace: "app-cache".to_string(),
            server_port: 3000,
            prune_interval: 60,
        }
    }
}
