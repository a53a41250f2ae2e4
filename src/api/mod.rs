//! API Module
//!
//! HTTP handlers and routing for the cache admin/diagnostics API.
//!
//! # Endpoints
//! - `GET /health` - Health check
//! - `GET /stats` - Tier sizes, keys and counters
//! - `PUT /entries` - Store a JSON value
//! - `GET /entries/:key` - Read a value
//! - `DELETE /entries/:key` - Delete a key
//! - `DELETE /entries` - Clear both tiers
//! - `DELETE /prefix/:prefix` - Delete keys by prefix
//! - `DELETE /users/:user_id` - Invalidate a user's cache
//! - `POST /prune` - Remove expired entries

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
