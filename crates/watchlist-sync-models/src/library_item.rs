use crate::canonical_id::CanonicalId;
use serde::{Deserialize, Serialize};

/// A movie in the media server's library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    pub rating_key: String,
    pub title: String,
    pub year: Option<u32>,
    /// Server-side content guid (e.g. `plex://movie/5d7768...`)
    pub guid: Option<String>,
    pub tmdb_id: Option<CanonicalId>,
}

impl LibraryItem {
    pub fn new(rating_key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            rating_key: rating_key.into(),
            title: title.into(),
            year: None,
            guid: None,
            tmdb_id: None,
        }
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_tmdb_id(mut self, tmdb_id: CanonicalId) -> Self {
        self.tmdb_id = Some(tmdb_id);
        self
    }

    /// Whether two items describe the same movie across API responses
    ///
    /// Compares TMDB ids when both sides have one, then content guids.
    /// Returns `None` when neither identifier is available on both sides.
    /// Rating keys are not compared: they are handles, not content identity.
    pub fn same_content(&self, other: &LibraryItem) -> Option<bool> {
        if let (Some(a), Some(b)) = (&self.tmdb_id, &other.tmdb_id) {
            return Some(a == b);
        }
        if let (Some(a), Some(b)) = (&self.guid, &other.guid) {
            return Some(a == b);
        }
        None
    }
}
