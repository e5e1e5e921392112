use crate::resolution_cache::{CacheStore, ResolutionCache};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use watchlist_sync_models::{CanonicalId, ItemReference};

/// Resolution cache kept as a flat JSON object on disk
///
/// `{"/film/heat-1995/": "949", "/film/obscure/": null}`
pub struct JsonCacheStore {
    cache_path: PathBuf,
}

impl JsonCacheStore {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self { cache_path: cache_path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    fn backup_unreadable(&self, reason: &str) {
        let backup_path = self.cache_path.with_extension("json.bak");
        if let Err(backup_err) = std::fs::copy(&self.cache_path, &backup_path) {
            warn!(
                "Resolution cache unreadable ({}) and backup failed: {}. Starting with empty cache.",
                reason, backup_err
            );
        } else {
            warn!(
                "Resolution cache unreadable ({}). Backed up old cache to {:?} and starting with empty cache.",
                reason, backup_path
            );
        }
    }
}

impl CacheStore for JsonCacheStore {
    fn load(&self) -> Result<ResolutionCache> {
        if !self.cache_path.exists() {
            debug!("Resolution cache {:?} does not exist, starting empty", self.cache_path);
            return Ok(ResolutionCache::new());
        }

        let start = std::time::Instant::now();
        let content = match std::fs::read_to_string(&self.cache_path) {
            Ok(content) => content,
            Err(e) => {
                self.backup_unreadable(&e.to_string());
                return Ok(ResolutionCache::new());
            }
        };
        let entries: BTreeMap<ItemReference, Option<CanonicalId>> = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                self.backup_unreadable(&e.to_string());
                return Ok(ResolutionCache::new());
            }
        };

        let cache = ResolutionCache::from_entries(entries);
        info!(
            "Loaded resolution cache: {} entries ({} unresolved) in {:?}",
            cache.len(),
            cache.unresolved_count(),
            start.elapsed()
        );
        Ok(cache)
    }

    fn save(&self, cache: &ResolutionCache) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(cache.entries())
            .context("Failed to serialize resolution cache")?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.cache_path.with_extension("tmp");
        std::fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write {:?}", temp_path))?;
        std::fs::rename(&temp_path, &self.cache_path)
            .with_context(|| format!("Failed to replace {:?}", self.cache_path))?;

        info!("Saved resolution cache: {} entries to {:?}", cache.len(), self.cache_path);
        Ok(())
    }
}
