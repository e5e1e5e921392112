use anyhow::Result;
use std::collections::BTreeMap;
use watchlist_sync_models::{CanonicalId, ItemReference};

/// In-memory map from list references to TMDB ids
///
/// A present key with `None` means the film page was fetched and carried no
/// TMDB link; such references are never fetched again. An absent key means
/// the reference has not been fetched successfully yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionCache {
    entries: BTreeMap<ItemReference, Option<CanonicalId>>,
    dirty: bool,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache as loaded from storage; starts clean
    pub fn from_entries(entries: BTreeMap<ItemReference, Option<CanonicalId>>) -> Self {
        Self { entries, dirty: false }
    }

    /// `None` when never attempted, `Some(None)` when unresolved
    pub fn get(&self, reference: &ItemReference) -> Option<Option<&CanonicalId>> {
        self.entries.get(reference).map(Option::as_ref)
    }

    pub fn contains(&self, reference: &ItemReference) -> bool {
        self.entries.contains_key(reference)
    }

    /// Record a resolution outcome; marks the cache dirty only if it changed
    pub fn insert(&mut self, reference: ItemReference, id: Option<CanonicalId>) {
        if self.entries.get(&reference) == Some(&id) {
            return;
        }
        self.entries.insert(reference, id);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|id| id.is_none()).count()
    }

    pub fn entries(&self) -> &BTreeMap<ItemReference, Option<CanonicalId>> {
        &self.entries
    }
}

/// Persistence for the resolution cache
pub trait CacheStore: Send + Sync {
    fn load(&self) -> Result<ResolutionCache>;
    fn save(&self, cache: &ResolutionCache) -> Result<()>;
}
