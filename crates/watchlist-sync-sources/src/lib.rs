pub mod traits;
pub mod error;
pub mod progress;
pub mod letterboxd;
pub mod plex;

pub use traits::{LibrarySearch, PageFetcher, PlaylistStore};
pub use error::FetchError;
pub use progress::ProgressTracker;
pub use letterboxd::LetterboxdHttpClient;
pub use plex::{PlexHttpClient, PlexLibrary};
