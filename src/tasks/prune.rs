//! Periodic prune task
//!
//! The cache never expires entries on its own timer; this task is the
//! scheduler that calls [`CacheService::prune_expired`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheService;

/// Spawns a task that prunes expired entries every `interval_secs` seconds.
///
/// The first pass runs one interval after spawning. Abort the returned
/// handle to stop it.
pub fn spawn_prune_task(cache: Arc<CacheService>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting prune task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let pass = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || pass.prune_expired()).await {
                Ok(0) => debug!("Prune: no expired entries found"),
                Ok(removed) => info!("Prune: removed {} expired entries", removed),
                Err(e) => warn!("Prune pass failed: {}", e),
            }
        }
    })
}
