use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LETTERBOXD_BASE_URL: &str = "https://letterboxd.com/";
pub const DEFAULT_PLAYLIST_NAME: &str = "Letterboxd Watchlist";
pub const PLEX_HOST_ENV: &str = "PLEX_HOST";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub letterboxd: Option<LetterboxdConfig>,
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub scrape: ScrapeOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterboxdConfig {
    /// Scrapes `<base_url>/<username>/watchlist/` when no explicit list is set
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub list_url: Option<String>,
    #[serde(default = "default_letterboxd_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    #[serde(default)]
    pub server_url: String,
    #[serde(default = "default_library_section")]
    pub library_section: String,
    #[serde(default = "default_playlist_name")]
    pub playlist_name: String,
}

/// Pacing for the list walker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOptions {
    #[serde(default = "default_item_delay_secs")]
    pub item_delay_secs: u64,
    #[serde(default = "default_page_delay_secs")]
    pub page_delay_secs: u64,
    #[serde(default = "default_rate_limit_pause_secs")]
    pub rate_limit_pause_secs: u64,
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    #[serde(default = "default_rate_limit_warn_after")]
    pub rate_limit_warn_after: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Daily-rotated log file; logs go to stderr when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_letterboxd_base_url() -> String {
    DEFAULT_LETTERBOXD_BASE_URL.to_string()
}

fn default_library_section() -> String {
    "Movies".to_string()
}

fn default_playlist_name() -> String {
    DEFAULT_PLAYLIST_NAME.to_string()
}

fn default_item_delay_secs() -> u64 {
    5
}

fn default_page_delay_secs() -> u64 {
    2
}

fn default_rate_limit_pause_secs() -> u64 {
    60
}

fn default_max_rate_limit_retries() -> u32 {
    30
}

fn default_rate_limit_warn_after() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for LetterboxdConfig {
    fn default() -> Self {
        Self {
            username: None,
            list_url: None,
            base_url: default_letterboxd_base_url(),
        }
    }
}

impl LetterboxdConfig {
    /// Address of the first listing page, if one can be derived
    pub fn list_url(&self) -> Option<String> {
        if let Some(url) = self.list_url.as_ref().filter(|u| !u.trim().is_empty()) {
            return Some(url.trim().to_string());
        }
        self.username
            .as_ref()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(|user| format!("{}/{}/watchlist/", self.base_url.trim_end_matches('/'), user))
    }
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            library_section: default_library_section(),
            playlist_name: default_playlist_name(),
        }
    }
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            item_delay_secs: default_item_delay_secs(),
            page_delay_secs: default_page_delay_secs(),
            rate_limit_pause_secs: default_rate_limit_pause_secs(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            rate_limit_warn_after: default_rate_limit_warn_after(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ScrapeOptions {
    pub fn item_delay(&self) -> Duration {
        Duration::from_secs(self.item_delay_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }

    pub fn rate_limit_pause(&self) -> Duration {
        Duration::from_secs(self.rate_limit_pause_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if present, otherwise start from defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `PLEX_HOST` on top of the file configuration
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var(PLEX_HOST_ENV) {
            if !host.trim().is_empty() {
                self.plex.server_url = host.trim().to_string();
            }
        }
        self
    }

    /// Checks needed before scraping
    pub fn validate_scrape(&self) -> anyhow::Result<()> {
        let letterboxd = self.letterboxd.as_ref()
            .ok_or_else(|| anyhow::anyhow!("Letterboxd is not configured. Run 'letterplex config letterboxd' first"))?;
        if !is_http_url(&letterboxd.base_url) {
            return Err(anyhow::anyhow!("letterboxd.base_url must be an http(s) URL: {}", letterboxd.base_url));
        }
        let list_url = letterboxd.list_url()
            .ok_or_else(|| anyhow::anyhow!("Set letterboxd.username or letterboxd.list_url"))?;
        if !is_http_url(&list_url) {
            return Err(anyhow::anyhow!("letterboxd.list_url must be an http(s) URL: {}", list_url));
        }
        Ok(())
    }

    /// Checks needed before touching the Plex server
    pub fn validate_sync(&self) -> anyhow::Result<()> {
        if self.plex.server_url.trim().is_empty() {
            return Err(anyhow::anyhow!("Plex server URL is not configured. Run 'letterplex config plex' or set {}", PLEX_HOST_ENV));
        }
        if !is_http_url(&self.plex.server_url) {
            return Err(anyhow::anyhow!("plex.server_url must be an http(s) URL: {}", self.plex.server_url));
        }
        if self.plex.playlist_name.trim().is_empty() {
            return Err(anyhow::anyhow!("plex.playlist_name cannot be empty"));
        }
        if self.plex.library_section.trim().is_empty() {
            return Err(anyhow::anyhow!("plex.library_section cannot be empty"));
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}
