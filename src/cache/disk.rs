//! Disk Cache Module
//!
//! Stores each entry as `<key>.blob` plus `<key>.metadata` under one folder.
//! No timestamp is stored: an entry's age comes from the filesystem's
//! modified or accessed time of its blob file.

use std::fs::{FileTimes, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::entry::{BinaryData, DiskEntry};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::{Cache, Throttle};
use crate::config::DiskCacheConfig;
use crate::error::{CacheError, Result};

// == Expiry Mode ==
/// Which file timestamp an entry's age is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryMode {
    /// Age since the last write; reads never extend an entry's life
    Modified,
    /// Age since the last read; a read refreshes the access time at most
    /// once per `update_interval`
    Accessed { update_interval: Duration },
}

impl ExpiryMode {
    fn from_config(config: &DiskCacheConfig) -> Self {
        if config.by_access_time {
            ExpiryMode::Accessed {
                update_interval: config.access_time_update_interval,
            }
        } else {
            ExpiryMode::Modified
        }
    }

    /// The timestamp this mode ages files by.
    pub fn timestamp(&self, metadata: &Metadata) -> io::Result<SystemTime> {
        match self {
            ExpiryMode::Modified => metadata.modified(),
            ExpiryMode::Accessed { .. } => metadata.accessed(),
        }
    }
}

// == Disk Cache ==
/// Filesystem-backed TTL cache returning file locators.
///
/// Cloning is cheap; clones share the folder, throttle and counters.
/// Concurrent writers of one key are not coordinated: the blob/metadata pair
/// is written as two separate files.
#[derive(Debug, Clone)]
pub struct DiskCache {
    inner: Arc<DiskCacheInner>,
}

#[derive(Debug)]
struct DiskCacheInner {
    folder: PathBuf,
    ttl: Duration,
    mode: ExpiryMode,
    cleanup: Throttle,
    stats: StatsRecorder,
}

impl DiskCache {
    // == Constructor ==
    /// Creates a cache over `config.cache_folder`.
    ///
    /// The folder must already exist and be a directory.
    pub fn new(config: DiskCacheConfig) -> Result<Self> {
        let folder = config.cache_folder.clone();
        let meta = std::fs::metadata(&folder).map_err(|e| {
            CacheError::InvalidConfig(format!(
                "cache folder {} is not accessible: {e}",
                folder.display()
            ))
        })?;
        if !meta.is_dir() {
            return Err(CacheError::InvalidConfig(format!(
                "cache folder {} is not a directory",
                folder.display()
            )));
        }

        Ok(Self {
            inner: Arc::new(DiskCacheInner {
                folder,
                ttl: config.ttl,
                mode: ExpiryMode::from_config(&config),
                cleanup: Throttle::new(config.cleanup_interval),
                stats: StatsRecorder::default(),
            }),
        })
    }

    /// Locator of `key`, whether or not it is stored.
    pub fn locate(&self, key: &str) -> DiskEntry {
        DiskEntry::locate(&self.inner.folder, key)
    }

    pub fn folder(&self) -> &Path {
        &self.inner.folder
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Minimum time between two background sweeps.
    pub fn cleanup_interval(&self) -> Duration {
        self.inner.cleanup.interval()
    }

    pub fn mode(&self) -> ExpiryMode {
        self.inner.mode
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    // == Sweep ==
    /// Deletes every file under the folder older than the TTL, awaiting
    /// completion. Returns the number of files removed.
    pub async fn sweep(&self) -> Result<usize> {
        self.inner.sweep().await
    }

    /// Dispatches a background sweep unless one ran within `cleanup_interval`.
    fn request_sweep(&self) {
        if !self.inner.cleanup.try_acquire() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = inner.sweep().await {
                warn!(folder = %inner.folder.display(), error = %e, "disk sweep failed");
            }
        });
    }

    /// Refreshes the access time of both files in the background.
    ///
    /// The blob's modified time is written to both files so the pair stays
    /// timestamp-consistent.
    fn refresh_access_time(&self, entry: DiskEntry, modified: Option<SystemTime>) {
        tokio::task::spawn_blocking(move || {
            if let Err(e) = touch_pair(&entry, SystemTime::now(), modified) {
                warn!(
                    blob = %entry.blob_file.display(),
                    error = %e,
                    "failed to refresh access time"
                );
            }
        });
    }

    /// Best-effort removal of an expired pair. Failures are logged only.
    async fn remove_stale(&self, entry: &DiskEntry) {
        let (blob, metadata) = tokio::join!(
            fs::remove_file(&entry.blob_file),
            fs::remove_file(&entry.metadata_file)
        );
        for (path, result) in [(&entry.blob_file, blob), (&entry.metadata_file, metadata)] {
            match result {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "stale file already gone");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove stale file");
                }
            }
        }
    }
}

impl DiskCacheInner {
    /// An entry is fresh while `stamp + ttl > now`. Timestamps in the future
    /// count as age zero.
    fn is_fresh(&self, stamp: SystemTime, now: SystemTime) -> bool {
        age(stamp, now) < self.ttl
    }

    async fn sweep(&self) -> Result<usize> {
        let now = SystemTime::now();
        let Some(cutoff) = now.checked_sub(self.ttl) else {
            self.stats.record_sweep(0);
            return Ok(0);
        };
        debug!(
            folder = %self.folder.display(),
            cutoff = %DateTime::<Utc>::from(cutoff),
            "starting disk sweep"
        );

        let mut removed = 0;
        let mut pending = vec![self.folder.clone()];
        let mut is_root = true;

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if is_root => return Err(CacheError::io(&dir, e)),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            is_root = false;

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "directory listing interrupted");
                        break;
                    }
                };
                let path = entry.path();

                // Symlinks below the root are never followed nor deleted
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to stat during sweep");
                        continue;
                    }
                };
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let stamp = match entry.metadata().await.and_then(|m| self.mode.timestamp(&m)) {
                    Ok(stamp) => stamp,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to stat during sweep");
                        continue;
                    }
                };
                if stamp > cutoff {
                    continue;
                }

                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to remove expired file");
                    }
                }
            }
        }

        self.stats.record_sweep(removed);
        if removed > 0 {
            info!(folder = %self.folder.display(), removed, "disk sweep removed expired files");
        } else {
            debug!(folder = %self.folder.display(), "disk sweep found no expired files");
        }
        Ok(removed)
    }
}

#[async_trait]
impl Cache for DiskCache {
    type Value = BinaryData;
    type Entry = DiskEntry;

    // == Get ==
    /// Returns the locator if the blob exists and is within its TTL.
    ///
    /// An expired pair is deleted before the miss is reported. In access-time
    /// mode a hit may schedule an access-time refresh, which is not awaited.
    async fn get(&self, key: &str) -> Result<Option<DiskEntry>> {
        let entry = self.locate(key);
        let meta = match fs::metadata(&entry.blob_file).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.inner.stats.record_miss();
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io(&entry.blob_file, e)),
        };

        let now = SystemTime::now();
        let stamp = self
            .inner
            .mode
            .timestamp(&meta)
            .map_err(|e| CacheError::io(&entry.blob_file, e))?;

        if !self.inner.is_fresh(stamp, now) {
            self.remove_stale(&entry).await;
            self.inner.stats.record_expired();
            debug!(key, "disk entry expired on read");
            return Ok(None);
        }

        if let ExpiryMode::Accessed { update_interval } = self.inner.mode {
            if age(stamp, now) > update_interval {
                self.refresh_access_time(entry.clone(), meta.modified().ok());
            }
        }

        self.inner.stats.record_hit();
        Ok(Some(entry))
    }

    // == Set ==
    /// Writes the blob, then the metadata JSON, and returns the locator.
    ///
    /// In access-time mode both files are also stamped as accessed now, since
    /// overwriting a file does not move its access time.
    async fn set(&self, key: &str, value: BinaryData) -> Result<DiskEntry> {
        self.request_sweep();

        let entry = self.locate(key);
        let metadata = serde_json::to_vec(&value.metadata)?;
        fs::write(&entry.blob_file, &value.data)
            .await
            .map_err(|e| CacheError::io(&entry.blob_file, e))?;
        fs::write(&entry.metadata_file, metadata)
            .await
            .map_err(|e| CacheError::io(&entry.metadata_file, e))?;

        if let ExpiryMode::Accessed { .. } = self.inner.mode {
            stamp_written(&entry).await?;
        }

        Ok(entry)
    }

    // == Invalidate ==
    /// Deletes both files. Any failure, a missing file included, is returned.
    async fn invalidate(&self, key: &str) -> Result<()> {
        let entry = self.locate(key);
        let (blob, metadata) = tokio::join!(
            fs::remove_file(&entry.blob_file),
            fs::remove_file(&entry.metadata_file)
        );
        blob.map_err(|e| CacheError::io(&entry.blob_file, e))?;
        metadata.map_err(|e| CacheError::io(&entry.metadata_file, e))?;
        Ok(())
    }
}

/// Marks a freshly written pair as accessed and modified now.
///
/// A pair removed in between by a concurrent sweep is logged, not reported:
/// the write itself succeeded and the next `get` simply misses.
async fn stamp_written(entry: &DiskEntry) -> Result<()> {
    let touched = entry.clone();
    let result = tokio::task::spawn_blocking(move || {
        let now = SystemTime::now();
        touch_pair(&touched, now, Some(now))
    })
    .await
    .map_err(|e| CacheError::io(&entry.blob_file, io::Error::other(e)))?;

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                blob = %entry.blob_file.display(),
                "entry removed before its access time was stamped"
            );
            Ok(())
        }
        Err(e) => Err(CacheError::io(&entry.blob_file, e)),
    }
}

fn age(stamp: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(stamp).unwrap_or(Duration::ZERO)
}

/// Sets the access time, and optionally the modified time, of both files.
fn touch_pair(entry: &DiskEntry, accessed: SystemTime, modified: Option<SystemTime>) -> io::Result<()> {
    let mut times = FileTimes::new().set_accessed(accessed);
    if let Some(modified) = modified {
        times = times.set_modified(modified);
    }
    for path in [&entry.blob_file, &entry.metadata_file] {
        std::fs::File::open(path)?.set_times(times)?;
    }
    Ok(())
}
