use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use watchlist_sync_models::{LibraryItem, PlaylistEntry, PlaylistHandle};
use watchlist_sync_sources::PlaylistStore;

/// What happened to the playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Nothing matched and there was no playlist
    Unchanged,
    /// Nothing matched, so the playlist was removed
    Deleted,
    Created { items: usize },
    /// Edited in place around one retained member
    Updated {
        kept_anchor: bool,
        removed: usize,
        added: usize,
    },
    /// In-place edit failed; the playlist was rebuilt from scratch
    Recreated { items: usize, cause: String },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to look up playlist: {0:#}")]
    Lookup(#[source] anyhow::Error),

    #[error("failed to create playlist: {0:#}")]
    Create(#[source] anyhow::Error),

    #[error("failed to delete playlist: {0:#}")]
    Delete(#[source] anyhow::Error),

    #[error("playlist update failed ({update}) and rebuilding it failed too: {fallback:#}")]
    FallbackFailed {
        update: String,
        #[source]
        fallback: anyhow::Error,
    },
}

/// Brings one named playlist in line with the matched items
///
/// Existing playlists are edited without ever becoming empty: one randomly
/// chosen target item (the anchor) stays in place while everything else is
/// removed, then the rest of the target is appended. Order is shuffled on
/// every run.
pub struct PlaylistReconciler<'a> {
    store: &'a dyn PlaylistStore,
    title: String,
}

impl<'a> PlaylistReconciler<'a> {
    pub fn new(store: &'a dyn PlaylistStore, title: impl Into<String>) -> Self {
        Self { store, title: title.into() }
    }

    pub async fn reconcile<R>(&self, items: &[LibraryItem], rng: &mut R) -> Result<ReconcileOutcome, ReconcileError>
    where
        R: Rng,
    {
        let existing = self
            .store
            .find_playlist(&self.title)
            .await
            .map_err(ReconcileError::Lookup)?;

        match (items.is_empty(), existing) {
            (true, None) => {
                info!("No matched items and no playlist '{}'; nothing to do", self.title);
                Ok(ReconcileOutcome::Unchanged)
            }
            (true, Some(handle)) => {
                self.store
                    .delete_playlist(&handle)
                    .await
                    .map_err(ReconcileError::Delete)?;
                info!("No matched items; deleted playlist '{}'", self.title);
                Ok(ReconcileOutcome::Deleted)
            }
            (false, None) => {
                let mut shuffled = items.to_vec();
                shuffled.shuffle(rng);
                self.store
                    .create_playlist(&self.title, &shuffled)
                    .await
                    .map_err(ReconcileError::Create)?;
                info!("Created playlist '{}' with {} items", self.title, shuffled.len());
                Ok(ReconcileOutcome::Created { items: shuffled.len() })
            }
            (false, Some(handle)) => {
                let mut shuffled = items.to_vec();
                shuffled.shuffle(rng);
                match self.update_in_place(&handle, &shuffled, rng).await {
                    Ok(outcome) => Ok(outcome),
                    Err(e) => {
                        warn!("Updating playlist '{}' in place failed: {:#}; rebuilding it", self.title, e);
                        self.recreate(&handle, &shuffled, format!("{:#}", e)).await
                    }
                }
            }
        }
    }

    async fn update_in_place<R>(
        &self,
        handle: &PlaylistHandle,
        shuffled: &[LibraryItem],
        rng: &mut R,
    ) -> Result<ReconcileOutcome>
    where
        R: Rng,
    {
        let anchor_index = rng.gen_range(0..shuffled.len());
        let anchor = &shuffled[anchor_index];
        let mut others: Vec<LibraryItem> = shuffled
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != anchor_index)
            .map(|(_, item)| item.clone())
            .collect();
        others.shuffle(rng);
        debug!("Anchor for '{}': {} ({})", self.title, anchor.title, anchor.rating_key);

        let entries = self.store.playlist_entries(handle).await?;
        let (kept, remove) = partition_around_anchor(entries, anchor);

        if !remove.is_empty() {
            self.store.remove_entries(handle, &remove).await?;
        }

        let mut to_add = Vec::with_capacity(others.len() + 1);
        if kept.is_none() {
            to_add.push(anchor.clone());
        }
        to_add.extend(others);
        if !to_add.is_empty() {
            self.store.add_items(handle, &to_add).await?;
        }

        info!(
            "Updated playlist '{}': kept {}, removed {}, added {}",
            self.title,
            if kept.is_some() { "anchor" } else { "nothing" },
            remove.len(),
            to_add.len()
        );
        Ok(ReconcileOutcome::Updated {
            kept_anchor: kept.is_some(),
            removed: remove.len(),
            added: to_add.len(),
        })
    }

    async fn recreate(
        &self,
        handle: &PlaylistHandle,
        shuffled: &[LibraryItem],
        cause: String,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        match self.delete_and_create(handle, shuffled).await {
            Ok(_) => {
                info!("Rebuilt playlist '{}' with {} items", self.title, shuffled.len());
                Ok(ReconcileOutcome::Recreated { items: shuffled.len(), cause })
            }
            Err(fallback) => {
                error!("Rebuilding playlist '{}' failed: {:#}", self.title, fallback);
                Err(ReconcileError::FallbackFailed { update: cause, fallback })
            }
        }
    }

    async fn delete_and_create(&self, handle: &PlaylistHandle, items: &[LibraryItem]) -> Result<PlaylistHandle> {
        self.store.delete_playlist(handle).await?;
        self.store.create_playlist(&self.title, items).await
    }
}

/// First member holding the anchor's content is kept; every other member,
/// including further copies of the anchor and members that cannot be
/// compared, is removed.
fn partition_around_anchor(
    entries: Vec<PlaylistEntry>,
    anchor: &LibraryItem,
) -> (Option<PlaylistEntry>, Vec<PlaylistEntry>) {
    let mut kept = None;
    let mut remove = Vec::new();
    for entry in entries {
        if kept.is_none() && entry.item.same_content(anchor) == Some(true) {
            kept = Some(entry);
        } else {
            remove.push(entry);
        }
    }
    (kept, remove)
}
