use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Overrides the platform config directory, e.g. for a mounted volume
pub const BASE_PATH_ENV: &str = "LETTERPLEX_BASE_PATH";

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    /// `$LETTERPLEX_BASE_PATH` when set, otherwise `<config dir>/letterplex`
    pub fn new() -> Result<Self> {
        let base_dir = base_dir(std::env::var_os(BASE_PATH_ENV), dirs::config_dir())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory; set {}", BASE_PATH_ENV))?;
        Ok(Self::from_base(base_dir))
    }

    /// Lay out config files at `base`, with data and logs in subdirectories
    pub fn from_base(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// Item reference -> TMDB id mappings collected while scraping
    pub fn resolution_cache_file(&self) -> PathBuf {
        self.cache_dir().join("film_cache.json")
    }

    /// Ordered TMDB ids produced by the last scrape
    pub fn watchlist_ids_file(&self) -> PathBuf {
        self.cache_dir().join("watchlist_ids.json")
    }

    /// Enriched `{film_name, tmdb_id, film_year}` records consumed by sync
    pub fn watchlist_entries_file(&self) -> PathBuf {
        self.cache_dir().join("tmdb_watchlist_cache.json")
    }

    /// Match report written at the end of every sync
    pub fn match_report_file(&self) -> PathBuf {
        self.cache_dir().join("plex_watchlist_cache.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        std::fs::create_dir_all(self.cache_dir())?;
        Ok(())
    }
}

fn base_dir(override_path: Option<OsString>, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    match override_path.filter(|v| !v.is_empty()) {
        Some(base) => Some(PathBuf::from(base)),
        None => config_dir.map(|dir| dir.join("letterplex")),
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // Without a config directory, fall back to the working directory
        Self::new().unwrap_or_else(|_| Self::from_base(PathBuf::from(".letterplex")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_base() {
        let paths = PathManager::from_base(PathBuf::from("/srv/letterplex"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/letterplex/config.toml"));
        assert_eq!(
            paths.resolution_cache_file(),
            PathBuf::from("/srv/letterplex/data/cache/film_cache.json")
        );
        assert_eq!(
            paths.match_report_file(),
            PathBuf::from("/srv/letterplex/data/cache/plex_watchlist_cache.json")
        );
    }

    #[test]
    fn test_base_dir_override_wins() {
        let config_dir = Some(PathBuf::from("/home/me/.config"));
        assert_eq!(
            base_dir(Some(OsString::from("/srv/letterplex")), config_dir.clone()),
            Some(PathBuf::from("/srv/letterplex"))
        );
        assert_eq!(
            base_dir(Some(OsString::new()), config_dir.clone()),
            Some(PathBuf::from("/home/me/.config/letterplex"))
        );
        assert_eq!(base_dir(None, config_dir), Some(PathBuf::from("/home/me/.config/letterplex")));
        assert_eq!(base_dir(None, None), None);
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::from_base(dir.path().join("base"));
        paths.ensure_directories().unwrap();
        assert!(paths.cache_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
