use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};
use watchlist_sync_models::{CanonicalId, LibraryItem, PlaylistEntry, PlaylistHandle};

const CLIENT_IDENTIFIER: &str = "letterplex";

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub key: String,
    pub type_: String,
    pub title: String,
}

/// Thin wrapper over the Plex Media Server HTTP API
pub struct PlexHttpClient {
    client: Client,
    token: String,
    server_url: String,
}

impl PlexHttpClient {
    pub fn new(token: String, server_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-token"),
                    reqwest::header::HeaderValue::from_str(&token)
                        .context("Invalid token format")?,
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token,
            server_url: server_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Machine identifier of the server, needed to build item URIs
    pub async fn get_machine_identifier(&self) -> Result<String> {
        let url = format!("{}/identity", self.server_url);
        let response = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to reach Plex server")?;
        let json = json_body(response, "identity").await?;

        json.get("MediaContainer")
            .and_then(|c| c.get("machineIdentifier"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Plex identity response has no machineIdentifier"))
    }

    pub async fn get_libraries(&self) -> Result<Vec<LibraryInfo>> {
        let url = format!("{}/library/sections", self.server_url);
        let response = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to get libraries")?;
        let json = json_body(response, "library sections").await?;

        let mut libraries = Vec::new();
        if let Some(dir_array) = container_array(&json, "Directory") {
            for dir in dir_array {
                let key = string_field(dir, "key").unwrap_or_default();
                let type_ = string_field(dir, "type").unwrap_or_default();
                let title = string_field(dir, "title").unwrap_or_default();
                libraries.push(LibraryInfo { key, type_, title });
            }
        }

        Ok(libraries)
    }

    /// Movies in one section whose title matches, optionally narrowed by year
    pub async fn search_section(&self, section_key: &str, title: &str, year: Option<u32>) -> Result<Vec<LibraryItem>> {
        let mut url = format!(
            "{}/library/sections/{}/all?type=1&includeGuids=1&title={}",
            self.server_url,
            section_key,
            urlencoding::encode(title)
        );
        if let Some(year_val) = year {
            url.push_str(&format!("&year={}", year_val));
        }

        debug!("Plex search: Searching for '{}' (year: {:?})", title, year);
        let response = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to search Plex library")?;
        let json = json_body(response, "search").await?;

        let items: Vec<LibraryItem> = container_array(&json, "Metadata")
            .map(|array| array.iter().filter_map(parse_library_item).collect())
            .unwrap_or_default();
        debug!("Plex search: Found {} results for '{}'", items.len(), title);
        Ok(items)
    }

    pub async fn get_playlists(&self) -> Result<Vec<PlaylistHandle>> {
        let url = format!("{}/playlists?playlistType=video", self.server_url);
        let response = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to list playlists")?;
        let json = json_body(response, "playlists").await?;

        Ok(container_array(&json, "Metadata")
            .map(|array| array.iter().filter_map(parse_playlist_handle).collect())
            .unwrap_or_default())
    }

    pub async fn get_playlist_items(&self, playlist_key: &str) -> Result<Vec<PlaylistEntry>> {
        let url = format!(
            "{}/playlists/{}/items?includeGuids=1",
            self.server_url, playlist_key
        );
        let response = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to get playlist items")?;
        let json = json_body(response, "playlist items").await?;

        Ok(container_array(&json, "Metadata")
            .map(|array| array.iter().filter_map(parse_playlist_entry).collect())
            .unwrap_or_default())
    }

    pub async fn create_playlist(&self, title: &str, machine_id: &str, rating_keys: &[String]) -> Result<PlaylistHandle> {
        let url = format!(
            "{}/playlists?type=video&smart=0&title={}&uri={}",
            self.server_url,
            urlencoding::encode(title),
            urlencoding::encode(&metadata_uri(machine_id, rating_keys))
        );
        let response = self
            .client
            .post(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to create playlist")?;
        let json = json_body(response, "create playlist").await?;

        container_array(&json, "Metadata")
            .and_then(|array| array.first())
            .and_then(parse_playlist_handle)
            .ok_or_else(|| anyhow::anyhow!("Plex did not return the created playlist '{}'", title))
    }

    pub async fn add_playlist_items(&self, playlist_key: &str, machine_id: &str, rating_keys: &[String]) -> Result<()> {
        let url = format!(
            "{}/playlists/{}/items?uri={}",
            self.server_url,
            playlist_key,
            urlencoding::encode(&metadata_uri(machine_id, rating_keys))
        );
        let response = self
            .client
            .put(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to add playlist items")?;
        expect_success(response, "add playlist items")
    }

    pub async fn remove_playlist_item(&self, playlist_key: &str, playlist_item_id: &str) -> Result<()> {
        let url = format!(
            "{}/playlists/{}/items/{}",
            self.server_url, playlist_key, playlist_item_id
        );
        let response = self
            .client
            .delete(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to remove playlist item")?;
        expect_success(response, "remove playlist item")
    }

    pub async fn delete_playlist(&self, playlist_key: &str) -> Result<()> {
        let url = format!("{}/playlists/{}", self.server_url, playlist_key);
        let response = self
            .client
            .delete(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .context("Failed to delete playlist")?;
        expect_success(response, "delete playlist")
    }
}

fn expect_success(response: Response, operation: &str) -> Result<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Plex {} failed: {}", operation, response.status()))
    }
}

async fn json_body(response: Response, operation: &str) -> Result<Value> {
    if !response.status().is_success() {
        return Err(anyhow::anyhow!("Plex {} failed: {}", operation, response.status()));
    }
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", operation))
}

/// `server://` URI naming library items, as the playlist endpoints expect
pub(crate) fn metadata_uri(machine_id: &str, rating_keys: &[String]) -> String {
    format!(
        "server://{}/com.plexapp.plugins.library/library/metadata/{}",
        machine_id,
        rating_keys.join(",")
    )
}

fn container_array<'a>(json: &'a Value, field: &str) -> Option<&'a Vec<Value>> {
    json.get("MediaContainer")
        .and_then(|c| c.get(field))
        .and_then(|v| v.as_array())
}

// Plex sends keys as strings but ids such as playlistItemID as numbers
fn string_field(item: &Value, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_guid_array(guid_value: &Value) -> Vec<String> {
    let mut guids = Vec::new();
    if let Some(guid_array) = guid_value.as_array() {
        for guid_obj in guid_array {
            if let Some(id) = guid_obj.get("id").and_then(|i| i.as_str()) {
                guids.push(id.to_string());
            } else if let Some(id_str) = guid_obj.as_str() {
                guids.push(id_str.to_string());
            }
        }
    } else if let Some(id) = guid_value.get("id").and_then(|i| i.as_str()) {
        guids.push(id.to_string());
    }
    guids
}

/// TMDB id from a Plex GUID such as `tmdb://949` or
/// `com.plexapp.agents.themoviedb://949?lang=en`
pub(crate) fn parse_tmdb_from_guid(guid: &str) -> Option<CanonicalId> {
    let start = guid
        .find("tmdb://")
        .map(|i| i + "tmdb://".len())
        .or_else(|| guid.find("themoviedb://").map(|i| i + "themoviedb://".len()))?;
    let tmdb_part = &guid[start..];
    tmdb_part
        .split(['?', '&'])
        .next()
        .and_then(|s| CanonicalId::new(s).ok())
}

pub(crate) fn parse_library_item(item: &Value) -> Option<LibraryItem> {
    let rating_key = string_field(item, "ratingKey")?;
    let title = item.get("title")?.as_str()?.to_string();
    let mut library_item = LibraryItem::new(rating_key, title);

    if let Some(year) = item.get("year").and_then(|y| y.as_u64()) {
        library_item = library_item.with_year(year as u32);
    }
    // Legacy agents put the external id in `guid`; the new agent lists them under `Guid`
    let plex_guid = item.get("guid").and_then(|g| g.as_str());
    let mut external = parse_guid_array(item.get("Guid").unwrap_or(&Value::Null));
    external.extend(plex_guid.map(str::to_string));
    if let Some(tmdb_id) = external.iter().find_map(|g| parse_tmdb_from_guid(g)) {
        library_item = library_item.with_tmdb_id(tmdb_id);
    }
    if let Some(guid) = plex_guid {
        library_item = library_item.with_guid(guid);
    }

    trace!("Plex: parsed item {:?}", library_item);
    Some(library_item)
}

pub(crate) fn parse_playlist_entry(item: &Value) -> Option<PlaylistEntry> {
    let playlist_item_id = string_field(item, "playlistItemID")?;
    let item = parse_library_item(item)?;
    Some(PlaylistEntry { playlist_item_id, item })
}

pub(crate) fn parse_playlist_handle(item: &Value) -> Option<PlaylistHandle> {
    Some(PlaylistHandle {
        rating_key: string_field(item, "ratingKey")?,
        title: item.get("title")?.as_str()?.to_string(),
    })
}
