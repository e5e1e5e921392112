pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, LetterboxdConfig, LoggingConfig, PlexConfig, ScrapeOptions, DEFAULT_LETTERBOXD_BASE_URL, DEFAULT_PLAYLIST_NAME, PLEX_HOST_ENV};
pub use credentials::{CredentialStore, PLEX_TOKEN_ENV};
pub use paths::{PathManager, BASE_PATH_ENV};
