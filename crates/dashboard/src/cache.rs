//! Restart-persistent key-value cache.
//!
//! Two entries back the polling loop: the last fetched [`ReadingSet`] and
//! the epoch-millisecond timestamp of that fetch. Each key is one file in
//! the cache directory. Read failures degrade to a miss so a corrupt file
//! costs one refetch, never a crash.

use std::fs;
use std::path::PathBuf;

use common::{Error, ReadingSet, Result};
use tracing::warn;

/// Cache key for the serialized reading set.
pub const READINGS_KEY: &str = "weather_data";
/// Cache key for the epoch-ms fetch timestamp.
pub const LAST_FETCH_KEY: &str = "last_fetch_time";

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open a cache directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            Error::Cache(format!("cannot create cache dir {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("cache read failed for {key}: {e}");
                None
            }
        }
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)
            .map_err(|e| Error::Cache(format!("cache write failed for {key}: {e}")))
    }

    /// The cached reading set, if one round-trips cleanly.
    pub fn readings(&self) -> Option<ReadingSet> {
        let raw = self.get(READINGS_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(set) => Some(set),
            Err(e) => {
                warn!("discarding unreadable cached readings: {e}");
                None
            }
        }
    }

    /// Overwrite both entries from a freshly applied set.
    pub fn store_readings(&self, set: &ReadingSet) -> Result<()> {
        let raw = serde_json::to_string(set)?;
        self.put(READINGS_KEY, &raw)?;
        self.put(LAST_FETCH_KEY, &set.fetched_at_ms.to_string())
    }

    /// Epoch milliseconds of the last successful fetch, if recorded.
    pub fn last_fetch_ms(&self) -> Option<i64> {
        self.get(LAST_FETCH_KEY)?.trim().parse().ok()
    }
}
