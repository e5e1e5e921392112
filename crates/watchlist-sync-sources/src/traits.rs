use anyhow::Result;
use async_trait::async_trait;
use watchlist_sync_models::{LibraryItem, PlaylistEntry, PlaylistHandle};
use crate::error::FetchError;

/// Fetches HTML documents for the list walker
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the body of a 2xx response
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Title/year search over the media server's movie library
///
/// Ranking is the server's business: the first result is treated as the
/// best match.
#[async_trait]
pub trait LibrarySearch: Send + Sync {
    async fn search(&self, title: &str, year: Option<u32>) -> Result<Vec<LibraryItem>>;
}

/// Playlist CRUD on the media server
///
/// Every method is a remote call and may fail independently.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn find_playlist(&self, title: &str) -> Result<Option<PlaylistHandle>>;

    async fn create_playlist(&self, title: &str, items: &[LibraryItem]) -> Result<PlaylistHandle>;

    async fn playlist_entries(&self, playlist: &PlaylistHandle) -> Result<Vec<PlaylistEntry>>;

    /// Append `items` in the given order
    async fn add_items(&self, playlist: &PlaylistHandle, items: &[LibraryItem]) -> Result<()>;

    async fn remove_entries(&self, playlist: &PlaylistHandle, entries: &[PlaylistEntry]) -> Result<()>;

    async fn delete_playlist(&self, playlist: &PlaylistHandle) -> Result<()>;
}
