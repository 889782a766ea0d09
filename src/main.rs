//! Tiercache sweeper
//!
//! Standalone daemon that owns one disk cache folder and deletes expired
//! blob/metadata files on a fixed period, so a folder filled by short-lived
//! writers still gets cleaned when nobody writes.

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiercache::{spawn_sweep_task, DiskCache, DiskCacheConfig};

/// Main entry point for the sweeper.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load disk cache configuration from environment variables
/// 3. Open the cache folder (must exist)
/// 4. Run one sweep immediately, then start the periodic sweep task
/// 5. Abort the task on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiercache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiercache sweeper");

    let config = DiskCacheConfig::from_env();
    info!(
        "Configuration loaded: folder={}, ttl={:?}, cleanup_interval={:?}, by_access_time={}",
        config.cache_folder.display(),
        config.ttl,
        config.cleanup_interval,
        config.by_access_time
    );

    let cache = DiskCache::new(config).context("failed to open cache folder")?;

    let removed = cache.sweep().await.context("initial sweep failed")?;
    info!("Initial sweep removed {} files", removed);

    let sweep_handle = spawn_sweep_task(cache.clone(), cache.cleanup_interval());
    shutdown_signal().await?;

    sweep_handle.abort();
    warn!("Sweep task aborted");

    let stats = cache.stats();
    info!(
        "Sweeper stopped after {} sweeps, {} files removed",
        stats.sweeps, stats.swept
    );
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res?;
            info!("Received Ctrl+C, initiating shutdown...");
        }
        res = terminate => {
            res?;
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
    Ok(())
}
