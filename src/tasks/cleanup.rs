//! Disk Sweep Task
//!
//! Background task that periodically removes expired files from a disk cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::DiskCache;

/// Spawns a background task that sweeps `cache` every `period`.
///
/// The task runs in an infinite loop, sleeping for `period` between sweeps.
/// Sweep failures are logged and the loop carries on. Unlike the throttled
/// sweep triggered by `set`, this one runs even when nothing is written.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = DiskCache::new(DiskCacheConfig::from_env())?;
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: DiskCache, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            folder = %cache.folder().display(),
            "Starting disk sweep task with period of {:?}",
            period
        );

        loop {
            tokio::time::sleep(period).await;

            if let Err(e) = cache.sweep().await {
                warn!(error = %e, "Disk sweep failed, retrying next period");
            }
        }
    })
}
