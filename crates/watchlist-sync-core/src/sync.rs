use crate::cache::CacheManager;
use crate::matcher::match_entries;
use crate::reconciler::{PlaylistReconciler, ReconcileOutcome};
use anyhow::Result;
use rand::Rng;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};
use watchlist_sync_models::{MatchResult, WatchlistEntry};
use watchlist_sync_sources::{LibrarySearch, PlaylistStore};

pub struct SyncResult {
    /// One verdict per entry, in entry order
    pub results: Vec<MatchResult>,
    pub outcome: ReconcileOutcome,
    pub report_path: PathBuf,
    pub duration: Duration,
}

impl SyncResult {
    pub fn matched(&self) -> usize {
        self.results.iter().filter(|r| r.availability.is_available()).count()
    }
}

/// Matches watchlist entries against the library and mirrors the hits into a playlist
pub struct LibrarySync<'a> {
    library: &'a dyn LibrarySearch,
    playlists: &'a dyn PlaylistStore,
    cache: &'a CacheManager,
    playlist_name: String,
    report_path: Option<PathBuf>,
}

impl<'a> LibrarySync<'a> {
    pub fn new(
        library: &'a dyn LibrarySearch,
        playlists: &'a dyn PlaylistStore,
        cache: &'a CacheManager,
        playlist_name: impl Into<String>,
    ) -> Self {
        Self {
            library,
            playlists,
            cache,
            playlist_name: playlist_name.into(),
            report_path: None,
        }
    }

    /// Write the match report somewhere other than the data directory
    pub fn with_report_path(mut self, path: Option<PathBuf>) -> Self {
        self.report_path = path;
        self
    }

    /// The match report is written even when the playlist could not be updated.
    #[instrument(skip_all, fields(entries = entries.len(), playlist = %self.playlist_name))]
    pub async fn run<R: Rng>(&self, entries: &[WatchlistEntry], rng: &mut R) -> Result<SyncResult> {
        let start = Instant::now();

        let matched = match_entries(entries, self.library).await;
        let reconciled = PlaylistReconciler::new(self.playlists, self.playlist_name.clone())
            .reconcile(&matched.matched, rng)
            .await;
        let report = self.cache.save_report(self.report_path.as_deref(), &matched.results);

        match (reconciled, report) {
            (Ok(outcome), Ok(report_path)) => {
                let result = SyncResult {
                    results: matched.results,
                    outcome,
                    report_path,
                    duration: start.elapsed(),
                };
                info!(
                    "Sync finished in {:?}: {} of {} entries in playlist ({:?})",
                    result.duration,
                    result.matched(),
                    result.results.len(),
                    result.outcome
                );
                Ok(result)
            }
            (Ok(_), Err(report_err)) => Err(report_err),
            (Err(reconcile_err), report) => {
                if let Err(report_err) = report {
                    error!("Failed to write match report: {:#}", report_err);
                }
                error!("Playlist reconciliation failed: {}", reconcile_err);
                Err(reconcile_err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::ReconcileError;
    use crate::testing::{FailOn, FakeLibrary, FakePlaylistStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use watchlist_sync_config::PathManager;
    use watchlist_sync_models::{Availability, CanonicalId, LibraryItem};

    fn setup() -> (tempfile::TempDir, CacheManager) {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(&PathManager::from_base(dir.path().to_path_buf())).unwrap();
        (dir, cache)
    }

    fn entries() -> Vec<WatchlistEntry> {
        vec![
            WatchlistEntry::new("Heat", Some(CanonicalId::from(949u64)), Some(1995)),
            WatchlistEntry::new("Ran", Some(CanonicalId::from(11645u64)), Some(1985)),
            WatchlistEntry::new("Lost Film", None, None),
        ]
    }

    fn library() -> FakeLibrary {
        FakeLibrary::default().with_item(
            "Heat",
            LibraryItem::new("10", "Heat").with_tmdb_id(CanonicalId::from(949u64)),
        )
    }

    #[tokio::test]
    async fn test_run_creates_playlist_and_writes_report() {
        let (_dir, cache) = setup();
        let library = library();
        let store = FakePlaylistStore::new();

        let result = LibrarySync::new(&library, &store, &cache, "Letterboxd Watchlist")
            .run(&entries(), &mut StdRng::seed_from_u64(4))
            .await
            .unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::Created { items: 1 });
        assert_eq!(result.matched(), 1);
        assert_eq!(store.members(), vec!["10".to_string()]);

        let report: Vec<MatchResult> =
            serde_json::from_str(&std::fs::read_to_string(&result.report_path).unwrap()).unwrap();
        let verdicts: Vec<Availability> = report.into_iter().map(|r| r.availability).collect();
        assert_eq!(
            verdicts,
            vec![Availability::Available, Availability::NotInLibrary, Availability::NotFound]
        );
    }

    #[tokio::test]
    async fn test_report_written_when_reconcile_fails() {
        let (dir, cache) = setup();
        let library = library();
        let store = FakePlaylistStore::new().failing(FailOn::Find);
        let report_path = dir.path().join("report.json");

        let err = LibrarySync::new(&library, &store, &cache, "Letterboxd Watchlist")
            .with_report_path(Some(report_path.clone()))
            .run(&entries(), &mut StdRng::seed_from_u64(4))
            .await
            .err()
            .unwrap();

        assert!(matches!(err.downcast_ref::<ReconcileError>(), Some(ReconcileError::Lookup(_))));
        let report: Vec<MatchResult> =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report.len(), 3);
    }

    #[tokio::test]
    async fn test_no_matches_removes_stale_playlist() {
        let (_dir, cache) = setup();
        let library = FakeLibrary::default();
        let store = FakePlaylistStore::with_playlist("Letterboxd Watchlist", &[LibraryItem::new("1", "Old")]);

        let result = LibrarySync::new(&library, &store, &cache, "Letterboxd Watchlist")
            .run(&entries(), &mut StdRng::seed_from_u64(4))
            .await
            .unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::Deleted);
        assert!(!store.exists());
    }
}
