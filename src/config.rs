//! Configuration Module
//!
//! Construction-time options for the disk and remote backends. The disk
//! options can also be loaded from environment variables for the sweeper
//! binary.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default minimum time between access-timestamp refreshes.
pub const DEFAULT_ACCESS_TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(5_000);

// == Disk Cache Config ==
/// Options for a `DiskCache`.
#[derive(Debug, Clone)]
pub struct DiskCacheConfig {
    /// Root directory for `<key>.blob` / `<key>.metadata` pairs, must exist
    pub cache_folder: PathBuf,
    /// Lifetime of an entry, measured from its modified or accessed time
    pub ttl: Duration,
    /// Minimum time between two background sweeps
    pub cleanup_interval: Duration,
    /// Expire by last access instead of last modification
    pub by_access_time: bool,
    /// Minimum time between two access-timestamp refreshes of one entry
    pub access_time_update_interval: Duration,
}

impl DiskCacheConfig {
    /// Creates a modified-time config for `cache_folder`.
    pub fn new(cache_folder: impl Into<PathBuf>, ttl: Duration, cleanup_interval: Duration) -> Self {
        Self {
            cache_folder: cache_folder.into(),
            ttl,
            cleanup_interval,
            ..Self::default()
        }
    }

    /// Switches to access-time expiry.
    pub fn by_access_time(mut self, update_interval: Duration) -> Self {
        self.by_access_time = true;
        self.access_time_update_interval = update_interval;
        self
    }

    /// Creates a new config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_FOLDER` - Cache root directory (default: `./cache`)
    /// - `CACHE_TTL_MS` - Entry lifetime in milliseconds (default: 300000)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep period in milliseconds (default: 60000)
    /// - `CACHE_BY_ACCESS_TIME` - `true`/`1` to expire by access time (default: false)
    /// - `CACHE_ACCESS_TIME_UPDATE_INTERVAL_MS` - Refresh interval (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_folder: env::var("CACHE_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_folder),
            ttl: env_millis("CACHE_TTL_MS").unwrap_or(defaults.ttl),
            cleanup_interval: env_millis("CACHE_CLEANUP_INTERVAL_MS")
                .unwrap_or(defaults.cleanup_interval),
            by_access_time: env::var("CACHE_BY_ACCESS_TIME")
                .ok()
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.by_access_time),
            access_time_update_interval: env_millis("CACHE_ACCESS_TIME_UPDATE_INTERVAL_MS")
                .unwrap_or(defaults.access_time_update_interval),
        }
    }
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            cache_folder: PathBuf::from("./cache"),
            ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
            by_access_time: false,
            access_time_update_interval: DEFAULT_ACCESS_TIME_UPDATE_INTERVAL,
        }
    }
}

// == Remote Cache Config ==
/// Target namespace of a `RemoteObjectCache`.
#[derive(Debug, Clone, Default)]
pub struct RemoteCacheConfig {
    pub bucket: String,
    /// Prepended verbatim to every key
    pub prefix: String,
}

impl RemoteCacheConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_config_default() {
        let config = DiskCacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert!(!config.by_access_time);
        assert_eq!(config.access_time_update_interval, Duration::from_millis(5_000));
    }

    #[test]
    fn test_disk_config_by_access_time() {
        let config = DiskCacheConfig::new("/tmp/c", Duration::from_secs(2), Duration::from_secs(3))
            .by_access_time(Duration::from_secs(1));
        assert!(config.by_access_time);
        assert_eq!(config.access_time_update_interval, Duration::from_secs(1));
        assert_eq!(config.cache_folder, PathBuf::from("/tmp/c"));
    }

    #[test]
    fn test_disk_config_from_env() {
        env::set_var("CACHE_FOLDER", "/var/cache/tier");
        env::set_var("CACHE_TTL_MS", "1500");
        env::set_var("CACHE_CLEANUP_INTERVAL_MS", "not-a-number");
        env::set_var("CACHE_BY_ACCESS_TIME", "TRUE");
        env::remove_var("CACHE_ACCESS_TIME_UPDATE_INTERVAL_MS");

        let config = DiskCacheConfig::from_env();
        assert_eq!(config.cache_folder, PathBuf::from("/var/cache/tier"));
        assert_eq!(config.ttl, Duration::from_millis(1500));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert!(config.by_access_time);
        assert_eq!(config.access_time_update_interval, DEFAULT_ACCESS_TIME_UPDATE_INTERVAL);

        env::remove_var("CACHE_FOLDER");
        env::remove_var("CACHE_TTL_MS");
        env::remove_var("CACHE_CLEANUP_INTERVAL_MS");
        env::remove_var("CACHE_BY_ACCESS_TIME");
    }

    #[test]
    fn test_remote_config_prefix() {
        let config = RemoteCacheConfig::new("bucket").with_prefix("cache/");
        assert_eq!(config.bucket, "bucket");
        assert_eq!(config.prefix, "cache/");
        assert_eq!(RemoteCacheConfig::new("b").prefix, "");
    }
}
