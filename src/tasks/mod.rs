//! Background Tasks Module
//!
//! # Tasks
//! - Prune: removes expired cache entries at the configured interval

mod prune;

pub use prune::spawn_prune_task;
