use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const PLEX_TOKEN_ENV: &str = "PLEX_TOKEN";

/// On-disk shape of `credentials.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plex_token: Option<String>,
}

/// The Plex token, kept apart from `config.toml` so the config can be shared
pub struct CredentialStore {
    path: PathBuf,
    credentials: Credentials,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: Credentials::default(),
        }
    }

    /// A missing file leaves the store empty
    pub fn load(&mut self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        self.credentials = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.credentials)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn get_plex_token(&self) -> Option<&String> {
        self.credentials.plex_token.as_ref()
    }

    pub fn set_plex_token(&mut self, token: String) {
        self.credentials.plex_token = Some(token);
    }

    /// Token to use for this run: `PLEX_TOKEN` wins over the stored value
    pub fn resolve_plex_token(&self) -> Option<String> {
        pick_token(std::env::var(PLEX_TOKEN_ENV).ok(), self.get_plex_token())
    }
}

fn pick_token(from_env: Option<String>, stored: Option<&String>) -> Option<String> {
    from_env
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| stored.cloned())
}
