use crate::resolution_cache::{CacheStore, ResolutionCache};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use watchlist_sync_config::ScrapeOptions;
use watchlist_sync_models::{CanonicalId, ItemReference};
use watchlist_sync_sources::letterboxd::{parse_detail_page, parse_list_page, resolve_link};
use watchlist_sync_sources::{FetchError, PageFetcher, ProgressTracker};

const PROGRESS_INTERVAL: usize = 25;

#[derive(Debug, Error)]
pub enum WalkError {
    /// The listing page no longer has the poster list
    #[error("no poster list found on {url}; the page layout may have changed")]
    StructuralChange { url: String },

    #[error("failed to fetch listing page: {0}")]
    Fetch(#[source] FetchError),

    #[error("cannot follow next-page link {href:?}: {reason}")]
    InvalidLink { href: String, reason: String },

    #[error("failed to persist resolution cache: {0:#}")]
    Cache(#[source] anyhow::Error),
}

/// Pacing and addressing for one walk
#[derive(Debug, Clone)]
pub struct WalkerOptions {
    /// Film references are joined onto this address
    pub base_url: String,
    pub item_delay: Duration,
    pub page_delay: Duration,
    pub rate_limit_pause: Duration,
    pub max_rate_limit_retries: u32,
    pub rate_limit_warn_after: u32,
}

impl WalkerOptions {
    pub fn new(base_url: impl Into<String>, scrape: &ScrapeOptions) -> Self {
        Self {
            base_url: base_url.into(),
            item_delay: scrape.item_delay(),
            page_delay: scrape.page_delay(),
            rate_limit_pause: scrape.rate_limit_pause(),
            max_rate_limit_retries: scrape.max_rate_limit_retries,
            rate_limit_warn_after: scrape.rate_limit_warn_after.max(1),
        }
    }
}

/// Result of a completed walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkOutcome {
    /// Resolved ids in first-seen order, without duplicates
    pub ids: Vec<CanonicalId>,
    pub pages_fetched: usize,
    /// Detail page requests, retries included
    pub detail_fetches: usize,
    pub cache_hits: usize,
    pub newly_resolved: usize,
    pub unresolved: usize,
    pub failed: usize,
    /// List entries without a reference
    pub skipped: usize,
    pub rate_limit_pauses: usize,
}

impl WalkOutcome {
    fn push_id(&mut self, seen: &mut HashSet<CanonicalId>, id: &CanonicalId) {
        if seen.insert(id.clone()) {
            self.ids.push(id.clone());
        }
    }
}

/// Walks a paginated Letterboxd list and resolves every film to a TMDB id
pub struct ListWalker<F> {
    fetcher: F,
    options: WalkerOptions,
}

impl<F: PageFetcher> ListWalker<F> {
    pub fn new(fetcher: F, options: WalkerOptions) -> Self {
        Self { fetcher, options }
    }

    /// Walk every page starting at `start_url`
    ///
    /// The cache is loaded from `store` up front and written back once,
    /// if it changed, on every way out of the walk.
    pub async fn walk(&self, start_url: &str, store: &dyn CacheStore) -> Result<WalkOutcome, WalkError> {
        let mut cache = store.load().map_err(WalkError::Cache)?;
        let mut outcome = WalkOutcome::default();
        let mut progress = ProgressTracker::new(PROGRESS_INTERVAL);

        info!("Walking list {} ({} cached references)", start_url, cache.len());
        let result = self.walk_pages(start_url, &mut cache, &mut outcome, &mut progress).await;
        progress.log_summary("List walk");

        if cache.is_dirty() {
            match store.save(&cache) {
                Ok(()) => cache.mark_clean(),
                Err(e) if result.is_ok() => return Err(WalkError::Cache(e)),
                Err(e) => error!("Failed to persist resolution cache after aborted walk: {:#}", e),
            }
        }

        result.map(|()| {
            info!(
                "List walk finished: {} ids from {} pages ({} cache hits, {} resolved, {} unresolved, {} failed)",
                outcome.ids.len(),
                outcome.pages_fetched,
                outcome.cache_hits,
                outcome.newly_resolved,
                outcome.unresolved,
                outcome.failed
            );
            outcome
        })
    }

    async fn walk_pages(
        &self,
        start_url: &str,
        cache: &mut ResolutionCache,
        outcome: &mut WalkOutcome,
        progress: &mut ProgressTracker,
    ) -> Result<(), WalkError> {
        let mut seen = HashSet::new();
        let mut url = start_url.to_string();

        loop {
            let html = self.fetcher.fetch_page(&url).await.map_err(WalkError::Fetch)?;
            outcome.pages_fetched += 1;

            let page = parse_list_page(&html).ok_or_else(|| WalkError::StructuralChange { url: url.clone() })?;
            info!(
                "Page {}: {} items ({})",
                outcome.pages_fetched,
                page.items.len(),
                url
            );
            progress.extend_total(page.items.len() + page.skipped);
            for _ in 0..page.skipped {
                outcome.skipped += 1;
                progress.record_skipped();
            }

            for reference in page.items {
                self.process_item(reference, cache, outcome, &mut seen, progress).await;
            }

            let Some(href) = page.next_href else {
                break;
            };
            let next = resolve_link(&url, &href).map_err(|e| WalkError::InvalidLink {
                href: href.clone(),
                reason: format!("{:#}", e),
            })?;
            debug!("Next page: {}", next);
            tokio::time::sleep(self.options.page_delay).await;
            url = next;
        }

        Ok(())
    }

    async fn process_item(
        &self,
        reference: ItemReference,
        cache: &mut ResolutionCache,
        outcome: &mut WalkOutcome,
        seen: &mut HashSet<CanonicalId>,
        progress: &mut ProgressTracker,
    ) {
        if let Some(cached) = cache.get(&reference) {
            debug!("Cache hit: {} -> {:?}", reference, cached);
            outcome.cache_hits += 1;
            if let Some(id) = cached {
                outcome.push_id(seen, id);
            }
            progress.record_cached();
            return;
        }

        let detail_url = match resolve_link(&self.options.base_url, reference.as_str()) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping {}: {:#}", reference, e);
                outcome.failed += 1;
                progress.record_failed_with_error("invalid link");
                return;
            }
        };

        let mut pauses: u32 = 0;
        loop {
            tokio::time::sleep(self.options.item_delay).await;
            outcome.detail_fetches += 1;

            match self.fetcher.fetch_page(&detail_url).await {
                Ok(html) => {
                    match parse_detail_page(&html) {
                        Some(id) => {
                            debug!("Resolved {} -> {}", reference, id);
                            outcome.newly_resolved += 1;
                            outcome.push_id(seen, &id);
                            cache.insert(reference, Some(id));
                            progress.record_resolved();
                        }
                        None => {
                            debug!("No TMDB link on {}", detail_url);
                            outcome.unresolved += 1;
                            cache.insert(reference, None);
                            progress.record_unresolved();
                        }
                    }
                    return;
                }
                Err(e) if e.is_rate_limited() => {
                    if pauses >= self.options.max_rate_limit_retries {
                        warn!(
                            "Giving up on {} after {} rate-limit pauses",
                            reference, pauses
                        );
                        outcome.failed += 1;
                        progress.record_failed_with_error("rate limit retries exhausted");
                        return;
                    }
                    pauses += 1;
                    outcome.rate_limit_pauses += 1;
                    warn!(
                        "Rate limited on {}, pausing for {:?}",
                        detail_url, self.options.rate_limit_pause
                    );
                    if pauses >= self.options.rate_limit_warn_after {
                        warn!(
                            "{} has been rate limited {} times in a row ({} retries left)",
                            reference,
                            pauses,
                            self.options.max_rate_limit_retries - pauses
                        );
                    }
                    tokio::time::sleep(self.options.rate_limit_pause).await;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", reference, e);
                    outcome.failed += 1;
                    progress.record_failed_with_error(e.category());
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
