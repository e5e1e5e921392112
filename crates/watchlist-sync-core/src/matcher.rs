use chrono::Local;
use tracing::{debug, info, warn};
use watchlist_sync_models::{Availability, LibraryItem, MatchResult, WatchlistEntry};
use watchlist_sync_sources::LibrarySearch;

/// Verdicts for every entry plus the items that go into the playlist
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// One per input entry, same order
    pub results: Vec<MatchResult>,
    /// Library items for the `Available` results, same order
    pub matched: Vec<LibraryItem>,
}

impl MatchOutcome {
    pub fn count(&self, availability: fn(&Availability) -> bool) -> usize {
        self.results.iter().filter(|r| availability(&r.availability)).count()
    }
}

/// Look each watchlist entry up in the library
///
/// Never fails: a search error becomes an `Error` verdict for that entry.
pub async fn match_entries(entries: &[WatchlistEntry], library: &dyn LibrarySearch) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    for entry in entries {
        if entry.tmdb_id.is_none() {
            debug!("'{}' has no TMDB id, not searching", entry.film_name);
            outcome
                .results
                .push(MatchResult::new(&entry.film_name, None, Availability::NotFound));
            continue;
        }

        match library.search(&entry.film_name, entry.film_year).await {
            Ok(items) => match items.into_iter().next() {
                Some(item) => {
                    debug!("'{}' matched library item {} ({})", entry.film_name, item.rating_key, item.title);
                    outcome.results.push(
                        MatchResult::new(&entry.film_name, entry.tmdb_id.clone(), Availability::Available)
                            .with_date_added(Local::now().naive_local()),
                    );
                    outcome.matched.push(item);
                }
                None => {
                    debug!("'{}' is not in the library", entry.film_name);
                    outcome.results.push(MatchResult::new(
                        &entry.film_name,
                        entry.tmdb_id.clone(),
                        Availability::NotInLibrary,
                    ));
                }
            },
            Err(e) => {
                warn!("Library search for '{}' failed: {:#}", entry.film_name, e);
                outcome.results.push(MatchResult::new(
                    &entry.film_name,
                    entry.tmdb_id.clone(),
                    Availability::Error(format!("{:#}", e)),
                ));
            }
        }
    }

    info!(
        "Matched {} of {} watchlist entries ({} not in library, {} without id, {} errors)",
        outcome.matched.len(),
        entries.len(),
        outcome.count(|a| matches!(a, Availability::NotInLibrary)),
        outcome.count(|a| matches!(a, Availability::NotFound)),
        outcome.count(|a| matches!(a, Availability::Error(_)))
    );
    outcome
}
