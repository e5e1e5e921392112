pub mod canonical_id;
pub mod watchlist_entry;
pub mod match_result;
pub mod library_item;
pub mod playlist;

pub use canonical_id::{CanonicalId, InvalidCanonicalId, ItemReference};
pub use watchlist_entry::WatchlistEntry;
pub use match_result::{Availability, MatchResult};
pub use library_item::LibraryItem;
pub use playlist::{PlaylistEntry, PlaylistHandle};
