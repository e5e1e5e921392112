use crate::resolution_cache_storage::JsonCacheStore;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use watchlist_sync_config::PathManager;
use watchlist_sync_models::{CanonicalId, MatchResult, WatchlistEntry};

/// Owns the JSON files under the data directory
#[derive(Clone)]
pub struct CacheManager {
    resolution_cache: PathBuf,
    watchlist_ids: PathBuf,
    watchlist_entries: PathBuf,
    match_report: PathBuf,
}

impl CacheManager {
    pub fn new(path_manager: &PathManager) -> Result<Self> {
        let cache_dir = path_manager.cache_dir();
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {:?}", cache_dir))?;
        Ok(Self {
            resolution_cache: path_manager.resolution_cache_file(),
            watchlist_ids: path_manager.watchlist_ids_file(),
            watchlist_entries: path_manager.watchlist_entries_file(),
            match_report: path_manager.match_report_file(),
        })
    }

    pub fn resolution_store(&self) -> JsonCacheStore {
        JsonCacheStore::new(&self.resolution_cache)
    }

    pub fn save_watchlist_ids(&self, ids: &[CanonicalId]) -> Result<()> {
        write_json(&self.watchlist_ids, ids)?;
        debug!("Saved {} watchlist ids to {:?}", ids.len(), self.watchlist_ids);
        Ok(())
    }

    /// Entries to match; a missing file is an error, not an empty watchlist
    pub fn load_entries(&self, path: Option<&Path>) -> Result<Vec<WatchlistEntry>> {
        let path = path.unwrap_or(self.watchlist_entries.as_path());
        if !path.exists() {
            return Err(anyhow!(
                "Watchlist entries file not found: {}. Produce it before running sync",
                path.display()
            ));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let entries: Vec<WatchlistEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded {} watchlist entries from {}", entries.len(), path.display());
        Ok(entries)
    }

    /// Overwrite the match report, returning where it was written
    pub fn save_report(&self, path: Option<&Path>, results: &[MatchResult]) -> Result<PathBuf> {
        let path = path.unwrap_or(self.match_report.as_path()).to_path_buf();
        write_json(&path, results)?;
        info!("Wrote match report ({} entries) to {}", results.len(), path.display());
        Ok(path)
    }

    /// Remove the resolution cache and the last scrape output
    pub fn clear_cache(&self) -> Result<()> {
        for path in [&self.resolution_cache, &self.watchlist_ids] {
            if path.exists() {
                std::fs::remove_file(path).with_context(|| format!("Failed to remove {:?}", path))?;
                info!("Removed {:?}", path);
            }
        }
        Ok(())
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
