use crate::plex::api::PlexHttpClient;
use crate::traits::{LibrarySearch, PlaylistStore};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};
use watchlist_sync_models::{LibraryItem, PlaylistEntry, PlaylistHandle};

/// One movie section of a Plex server, plus its playlists
///
/// The section key and machine identifier are resolved once in
/// [`PlexLibrary::connect`] so each search or playlist edit is a single request.
pub struct PlexLibrary {
    api: PlexHttpClient,
    section_key: String,
    machine_id: String,
}

impl PlexLibrary {
    pub async fn connect(api: PlexHttpClient, section_title: &str) -> Result<Self> {
        let machine_id = api.get_machine_identifier().await?;
        let libraries = api.get_libraries().await?;
        let section = libraries
            .iter()
            .find(|lib| lib.title == section_title)
            .ok_or_else(|| {
                let available: Vec<&str> = libraries.iter().map(|lib| lib.title.as_str()).collect();
                anyhow::anyhow!(
                    "Plex library section '{}' not found (available: {})",
                    section_title,
                    available.join(", ")
                )
            })?;
        if section.type_ != "movie" {
            return Err(anyhow::anyhow!(
                "Plex library section '{}' is a {} library, expected movie",
                section_title,
                section.type_
            ));
        }

        info!(
            "Plex: connected to {} (section '{}', key {})",
            api.server_url(),
            section.title,
            section.key
        );
        Ok(Self {
            section_key: section.key.clone(),
            machine_id,
            api,
        })
    }

    fn rating_keys(items: &[LibraryItem]) -> Vec<String> {
        items.iter().map(|item| item.rating_key.clone()).collect()
    }
}

#[async_trait]
impl LibrarySearch for PlexLibrary {
    async fn search(&self, title: &str, year: Option<u32>) -> Result<Vec<LibraryItem>> {
        self.api.search_section(&self.section_key, title, year).await
    }
}

#[async_trait]
impl PlaylistStore for PlexLibrary {
    async fn find_playlist(&self, title: &str) -> Result<Option<PlaylistHandle>> {
        let playlists = self.api.get_playlists().await?;
        debug!("Plex: {} video playlists on server", playlists.len());
        Ok(playlists.into_iter().find(|p| p.title == title))
    }

    async fn create_playlist(&self, title: &str, items: &[LibraryItem]) -> Result<PlaylistHandle> {
        if items.is_empty() {
            return Err(anyhow::anyhow!("Cannot create playlist '{}' without items", title));
        }
        self.api
            .create_playlist(title, &self.machine_id, &Self::rating_keys(items))
            .await
    }

    async fn playlist_entries(&self, playlist: &PlaylistHandle) -> Result<Vec<PlaylistEntry>> {
        self.api.get_playlist_items(&playlist.rating_key).await
    }

    async fn add_items(&self, playlist: &PlaylistHandle, items: &[LibraryItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.api
            .add_playlist_items(&playlist.rating_key, &self.machine_id, &Self::rating_keys(items))
            .await
    }

    async fn remove_entries(&self, playlist: &PlaylistHandle, entries: &[PlaylistEntry]) -> Result<()> {
        for entry in entries {
            self.api
                .remove_playlist_item(&playlist.rating_key, &entry.playlist_item_id)
                .await?;
        }
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<()> {
        self.api.delete_playlist(&playlist.rating_key).await
    }
}
