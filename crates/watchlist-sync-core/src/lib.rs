pub mod resolution_cache;
pub mod resolution_cache_storage;
pub mod walker;
pub mod matcher;
pub mod reconciler;
pub mod cache;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use resolution_cache::{CacheStore, ResolutionCache};
pub use resolution_cache_storage::JsonCacheStore;
pub use walker::{ListWalker, WalkError, WalkOutcome, WalkerOptions};
pub use matcher::{match_entries, MatchOutcome};
pub use reconciler::{PlaylistReconciler, ReconcileError, ReconcileOutcome};
pub use cache::CacheManager;
pub use sync::{LibrarySync, SyncResult};
