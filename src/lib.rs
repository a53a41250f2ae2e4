//! Meal Cache - a two-tier local cache
//!
//! Bounded FIFO memory tier over a persistent key/value store, with per-entry
//! TTL, lazy expiry and a small admin HTTP API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheService, SetOptions};
pub use config::Config;
pub use tasks::spawn_prune_task;
