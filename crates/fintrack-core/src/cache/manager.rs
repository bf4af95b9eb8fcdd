use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::query::{QueryData, QueryKey};

/// Queries older than this are refetched when next viewed
const CACHE_STALE_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() >= CACHE_STALE_MINUTES
    }
}

/// On-disk JSON snapshots of query results, one file per query key.
///
/// Snapshots let the UI render the last known data at startup while the
/// first refresh is in flight.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    /// Persist a fetched query result
    pub fn save_query(&self, data: &QueryData) -> Result<()> {
        let name = data.key().snapshot_name();
        debug!(cache = %name, "Saving snapshot");
        self.save(&name, data)
    }

    /// Snapshot for `key`, ignoring files that belong to a different query
    pub fn load_query(&self, key: &QueryKey) -> Result<Option<CachedData<QueryData>>> {
        let name = key.snapshot_name();
        let cached: Option<CachedData<QueryData>> = self.load(&name)?;
        Ok(cached.filter(|c| c.data.key() == *key))
    }

    /// Every readable snapshot among `keys`. Unreadable files are logged and skipped.
    pub fn load_snapshots(&self, keys: &[QueryKey]) -> Vec<CachedData<QueryData>> {
        keys.iter()
            .filter_map(|key| match self.load_query(key) {
                Ok(found) => found,
                Err(e) => {
                    warn!(cache = %key.snapshot_name(), error = %e, "Ignoring unreadable snapshot");
                    None
                }
            })
            .collect()
    }

    /// Remove every snapshot (logout)
    pub fn clear(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            return Ok(());
        }
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
