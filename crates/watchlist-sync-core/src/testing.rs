//! In-memory fakes shared by the unit tests

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use crate::resolution_cache::{CacheStore, ResolutionCache};
use watchlist_sync_models::{LibraryItem, PlaylistEntry, PlaylistHandle};
use watchlist_sync_sources::{FetchError, LibrarySearch, PageFetcher, PlaylistStore};

/// Scripted responses per URL; the last response for a URL repeats
#[derive(Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: Result<String, FetchError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn page(self, url: &str, html: String) -> Self {
        self.respond(url, Ok(html))
    }

    pub fn rate_limited(self, url: &str) -> Self {
        self.respond(url, Err(FetchError::RateLimited { url: url.to_string() }))
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(FetchError::Status { url: url.to_string(), status: 404 }),
        }
    }
}

/// Listing page HTML with the given references and optional next link
pub fn list_page(references: &[&str], next: Option<&str>) -> String {
    let entries: String = references
        .iter()
        .map(|r| format!(r#"<li class="poster-container"><div class="film-poster" data-target-link="{}"></div></li>"#, r))
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="next" href="{}">Older</a>"#, href))
        .unwrap_or_default();
    format!(r#"<html><body><ul class="poster-list">{}</ul>{}</body></html>"#, entries, next)
}

/// Film page HTML, linking to TMDB when an id is given
pub fn film_page(tmdb_id: Option<u64>) -> String {
    let link = tmdb_id
        .map(|id| format!(r#"<a href="https://www.themoviedb.org/movie/{}/" class="micro-button">TMDb</a>"#, id))
        .unwrap_or_default();
    format!(
        r#"<html><body><a href="http://www.imdb.com/title/tt0000001/">IMDb</a>{}</body></html>"#,
        link
    )
}

/// Library keyed by title; titles listed in `failing` return an error
#[derive(Default)]
pub struct FakeLibrary {
    items: HashMap<String, Vec<LibraryItem>>,
    failing: Vec<String>,
    searches: Mutex<Vec<(String, Option<u32>)>>,
}

impl FakeLibrary {
    pub fn with_item(mut self, title: &str, item: LibraryItem) -> Self {
        self.items.entry(title.to_string()).or_default().push(item);
        self
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing.push(title.to_string());
        self
    }

    pub fn searches(&self) -> Vec<(String, Option<u32>)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl LibrarySearch for FakeLibrary {
    async fn search(&self, title: &str, year: Option<u32>) -> Result<Vec<LibraryItem>> {
        self.searches.lock().unwrap().push((title.to_string(), year));
        if self.failing.iter().any(|t| t == title) {
            return Err(anyhow::anyhow!("connection refused"));
        }
        Ok(self.items.get(title).cloned().unwrap_or_default())
    }
}

/// Which playlist operation a [`FakePlaylistStore`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Find,
    Create,
    Entries,
    Add,
    Remove,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistCall {
    Find,
    Create(Vec<String>),
    Entries,
    Add(Vec<String>),
    Remove(Vec<String>),
    Delete,
}

/// Single-playlist server kept in memory
#[derive(Default)]
pub struct FakePlaylistStore {
    playlist: Mutex<Option<(PlaylistHandle, Vec<PlaylistEntry>)>>,
    next_item_id: Mutex<u64>,
    fail_on: Vec<FailOn>,
    calls: Mutex<Vec<PlaylistCall>>,
}

impl FakePlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(title: &str, items: &[LibraryItem]) -> Self {
        let store = Self::default();
        let handle = PlaylistHandle { rating_key: "900".to_string(), title: title.to_string() };
        let entries = items.iter().map(|item| store.entry(item)).collect();
        *store.playlist.lock().unwrap() = Some((handle, entries));
        store
    }

    pub fn failing(mut self, op: FailOn) -> Self {
        self.fail_on.push(op);
        self
    }

    pub fn calls(&self) -> Vec<PlaylistCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exists(&self) -> bool {
        self.playlist.lock().unwrap().is_some()
    }

    /// Rating keys of the current members, in playlist order
    pub fn members(&self) -> Vec<String> {
        self.playlist
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, entries)| entries.iter().map(|e| e.item.rating_key.clone()).collect())
            .unwrap_or_default()
    }

    fn entry(&self, item: &LibraryItem) -> PlaylistEntry {
        let mut next = self.next_item_id.lock().unwrap();
        *next += 1;
        PlaylistEntry { playlist_item_id: format!("pi-{}", next), item: item.clone() }
    }

    fn check(&self, op: FailOn) -> Result<()> {
        if self.fail_on.contains(&op) {
            return Err(anyhow::anyhow!("server rejected {:?}", op));
        }
        Ok(())
    }

    fn record(&self, call: PlaylistCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn keys(items: &[LibraryItem]) -> Vec<String> {
    items.iter().map(|i| i.rating_key.clone()).collect()
}

#[async_trait]
impl PlaylistStore for FakePlaylistStore {
    async fn find_playlist(&self, title: &str) -> Result<Option<PlaylistHandle>> {
        self.record(PlaylistCall::Find);
        self.check(FailOn::Find)?;
        Ok(self
            .playlist
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(handle, _)| handle.title == title)
            .map(|(handle, _)| handle.clone()))
    }

    async fn create_playlist(&self, title: &str, items: &[LibraryItem]) -> Result<PlaylistHandle> {
        self.record(PlaylistCall::Create(keys(items)));
        self.check(FailOn::Create)?;
        let handle = PlaylistHandle { rating_key: "901".to_string(), title: title.to_string() };
        let entries = items.iter().map(|item| self.entry(item)).collect();
        *self.playlist.lock().unwrap() = Some((handle.clone(), entries));
        Ok(handle)
    }

    async fn playlist_entries(&self, _playlist: &PlaylistHandle) -> Result<Vec<PlaylistEntry>> {
        self.record(PlaylistCall::Entries);
        self.check(FailOn::Entries)?;
        Ok(self
            .playlist
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, entries)| entries.clone())
            .unwrap_or_default())
    }

    async fn add_items(&self, _playlist: &PlaylistHandle, items: &[LibraryItem]) -> Result<()> {
        self.record(PlaylistCall::Add(keys(items)));
        self.check(FailOn::Add)?;
        let new_entries: Vec<PlaylistEntry> = items.iter().map(|item| self.entry(item)).collect();
        if let Some((_, entries)) = self.playlist.lock().unwrap().as_mut() {
            entries.extend(new_entries);
        }
        Ok(())
    }

    async fn remove_entries(&self, _playlist: &PlaylistHandle, removed: &[PlaylistEntry]) -> Result<()> {
        self.record(PlaylistCall::Remove(removed.iter().map(|e| e.item.rating_key.clone()).collect()));
        self.check(FailOn::Remove)?;
        if let Some((_, entries)) = self.playlist.lock().unwrap().as_mut() {
            entries.retain(|e| !removed.iter().any(|r| r.playlist_item_id == e.playlist_item_id));
        }
        Ok(())
    }

    async fn delete_playlist(&self, _playlist: &PlaylistHandle) -> Result<()> {
        self.record(PlaylistCall::Delete);
        self.check(FailOn::Delete)?;
        *self.playlist.lock().unwrap() = None;
        Ok(())
    }
}

/// In-process resolution cache store
#[derive(Default)]
pub struct MemoryCacheStore {
    cache: Mutex<ResolutionCache>,
    saves: Mutex<usize>,
    fail_saves: bool,
}

impl MemoryCacheStore {
    pub fn new(cache: ResolutionCache) -> Self {
        Self {
            cache: Mutex::new(cache),
            ..Self::default()
        }
    }

    /// Store whose saves always fail
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> ResolutionCache {
        self.cache.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|s| *s).unwrap_or_default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self) -> Result<ResolutionCache> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| anyhow::anyhow!("resolution cache lock poisoned"))?;
        let mut loaded = cache.clone();
        loaded.mark_clean();
        Ok(loaded)
    }

    fn save(&self, cache: &ResolutionCache) -> Result<()> {
        if self.fail_saves {
            return Err(anyhow::anyhow!("resolution cache storage unavailable"));
        }
        let mut stored = self
            .cache
            .lock()
            .map_err(|_| anyhow::anyhow!("resolution cache lock poisoned"))?;
        *stored = cache.clone();
        stored.mark_clean();
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

mod tests {
    use super::*;
    use watchlist_sync_models::ItemReference;

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryCacheStore::default();
        let mut cache = store.load().unwrap();
        cache.insert(ItemReference::new("/film/ran/"), None);
        store.save(&cache).unwrap();

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.snapshot().len(), 1);
        assert!(MemoryCacheStore::failing().save(&cache).is_err());
    }
}
