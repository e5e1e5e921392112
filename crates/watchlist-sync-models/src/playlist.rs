use crate::library_item::LibraryItem;
use serde::{Deserialize, Serialize};

/// A server-side playlist, as found by title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistHandle {
    pub rating_key: String,
    pub title: String,
}

/// One member of a playlist
///
/// `playlist_item_id` addresses the membership itself and is what removal
/// needs; the same movie may appear under several ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub playlist_item_id: String,
    pub item: LibraryItem,
}
