use super::*;
use crate::testing::{film_page, list_page, FakeFetcher, MemoryCacheStore};
use tokio::time::Instant;

const BASE: &str = "https://letterboxd.test/";
const PAGE_1: &str = "https://letterboxd.test/someone/watchlist/";
const PAGE_2: &str = "https://letterboxd.test/someone/watchlist/page/2/";

fn options() -> WalkerOptions {
    WalkerOptions::new(BASE, &ScrapeOptions::default())
}

fn film_url(slug: &str) -> String {
    format!("{}film/{}/", BASE, slug)
}

fn id(value: u64) -> CanonicalId {
    CanonicalId::from(value)
}

fn cache_with(entries: &[(&str, Option<u64>)]) -> ResolutionCache {
    let mut cache = ResolutionCache::new();
    for (reference, tmdb) in entries {
        cache.insert(ItemReference::new(*reference), tmdb.map(CanonicalId::from));
    }
    cache.mark_clean();
    cache
}

#[tokio::test(start_paused = true)]
async fn test_two_page_walk_with_warm_and_cold_items() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/cached/", "/film/fresh/"], Some("/someone/watchlist/page/2/")))
        .page(PAGE_2, list_page(&["/film/no-link/"], None))
        .page(&film_url("fresh"), film_page(Some(200)))
        .page(&film_url("no-link"), film_page(None));
    let store = MemoryCacheStore::new(cache_with(&[("/film/cached/", Some(100))]));

    let walker = ListWalker::new(fetcher, options());
    let outcome = walker.walk(PAGE_1, &store).await.unwrap();

    assert_eq!(outcome.ids, vec![id(100), id(200)]);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.cache_hits, 1);
    assert_eq!(outcome.newly_resolved, 1);
    assert_eq!(outcome.unresolved, 1);
    assert_eq!(outcome.detail_fetches, 2);

    let cache = store.snapshot();
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(&ItemReference::new("/film/fresh/")), Some(Some(&id(200))));
    assert_eq!(cache.get(&ItemReference::new("/film/no-link/")), Some(None));
    assert_eq!(store.save_count(), 1);

    assert_eq!(walker.fetcher.request_count(&film_url("cached")), 0);
    assert_eq!(walker.fetcher.request_count(&film_url("fresh")), 1);
    assert_eq!(walker.fetcher.request_count(&film_url("no-link")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_walk_with_warm_cache_fetches_no_details() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/a/", "/film/b/", "/film/c/"], None))
        .page(&film_url("a"), film_page(Some(1)))
        .page(&film_url("b"), film_page(None))
        .page(&film_url("c"), film_page(Some(3)));
    let store = MemoryCacheStore::default();
    let walker = ListWalker::new(fetcher, options());

    let first = walker.walk(PAGE_1, &store).await.unwrap();
    let details_after_first = walker.fetcher.requests().len();
    let second = walker.walk(PAGE_1, &store).await.unwrap();

    assert_eq!(first.ids, vec![id(1), id(3)]);
    assert_eq!(second.ids, first.ids);
    assert_eq!(second.detail_fetches, 0);
    assert_eq!(second.cache_hits, 3);
    // Only the listing page is requested again
    assert_eq!(walker.fetcher.requests().len(), details_after_first + 1);
    // Nothing changed, so nothing is written on the second run
    assert_eq!(store.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_ids_are_returned_once() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/heat/", "/film/heat-1995/"], None))
        .page(&film_url("heat"), film_page(Some(949)))
        .page(&film_url("heat-1995"), film_page(Some(949)));
    let walker = ListWalker::new(fetcher, options());

    let outcome = walker.walk(PAGE_1, &MemoryCacheStore::default()).await.unwrap();
    assert_eq!(outcome.ids, vec![id(949)]);
    assert_eq!(outcome.newly_resolved, 2);
}

#[tokio::test(start_paused = true)]
async fn test_pagination_fetches_each_page_once() {
    let mut fetcher = FakeFetcher::new();
    for page in 1..=4 {
        let url = if page == 1 { PAGE_1.to_string() } else { format!("{}page/{}/", PAGE_1, page) };
        let next = (page < 4).then(|| format!("/someone/watchlist/page/{}/", page + 1));
        fetcher = fetcher.page(&url, list_page(&[], next.as_deref()));
    }
    let walker = ListWalker::new(fetcher, options());

    let outcome = walker.walk(PAGE_1, &MemoryCacheStore::default()).await.unwrap();
    assert_eq!(outcome.pages_fetched, 4);
    assert_eq!(walker.fetcher.requests().len(), 4);
    assert!(outcome.ids.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_item_is_retried_not_skipped() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/busy/"], None))
        .rate_limited(&film_url("busy"))
        .page(&film_url("busy"), film_page(Some(42)));
    let walker = ListWalker::new(fetcher, options());

    let store = MemoryCacheStore::default();
    let start = Instant::now();
    let outcome = walker.walk(PAGE_1, &store).await.unwrap();

    assert_eq!(outcome.ids, vec![id(42)]);
    assert_eq!(outcome.rate_limit_pauses, 1);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.detail_fetches, 2);
    let cache = store.snapshot();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&ItemReference::new("/film/busy/")), Some(Some(&id(42))));
    // item delay, back-off pause, item delay again
    assert!(start.elapsed() >= Duration::from_secs(5 + 60 + 5));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_retries_are_capped() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/stuck/", "/film/fine/"], None))
        .rate_limited(&film_url("stuck"))
        .page(&film_url("fine"), film_page(Some(7)));
    let scrape = ScrapeOptions {
        max_rate_limit_retries: 2,
        ..ScrapeOptions::default()
    };
    let walker = ListWalker::new(fetcher, WalkerOptions::new(BASE, &scrape));
    let store = MemoryCacheStore::default();

    let outcome = walker.walk(PAGE_1, &store).await.unwrap();

    assert_eq!(outcome.ids, vec![id(7)]);
    assert_eq!(outcome.rate_limit_pauses, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(walker.fetcher.request_count(&film_url("stuck")), 3);
    assert!(!store.snapshot().contains(&ItemReference::new("/film/stuck/")));
}

#[tokio::test(start_paused = true)]
async fn test_detail_error_skips_item_without_caching() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/gone/", "/film/ok/"], None))
        .page(&film_url("ok"), film_page(Some(5)));
    let walker = ListWalker::new(fetcher, options());
    let store = MemoryCacheStore::default();

    let outcome = walker.walk(PAGE_1, &store).await.unwrap();

    assert_eq!(outcome.ids, vec![id(5)]);
    assert_eq!(outcome.failed, 1);
    let cache = store.snapshot();
    assert!(!cache.contains(&ItemReference::new("/film/gone/")));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unresolved_references_are_not_refetched() {
    let fetcher = FakeFetcher::new().page(PAGE_1, list_page(&["/film/obscure/"], None));
    let store = MemoryCacheStore::new(cache_with(&[("/film/obscure/", None)]));
    let walker = ListWalker::new(fetcher, options());

    let outcome = walker.walk(PAGE_1, &store).await.unwrap();
    assert!(outcome.ids.is_empty());
    assert_eq!(outcome.detail_fetches, 0);
    assert_eq!(walker.fetcher.request_count(&film_url("obscure")), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_container_aborts_and_keeps_progress() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/first/"], Some("/someone/watchlist/page/2/")))
        .page(PAGE_2, "<html><body><p>Redesigned!</p></body></html>".to_string())
        .page(&film_url("first"), film_page(Some(11)));
    let store = MemoryCacheStore::default();
    let walker = ListWalker::new(fetcher, options());

    let err = walker.walk(PAGE_1, &store).await.unwrap_err();
    match err {
        WalkError::StructuralChange { url } => assert_eq!(url, PAGE_2),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.snapshot().get(&ItemReference::new("/film/first/")), Some(Some(&id(11))));
}

#[tokio::test(start_paused = true)]
async fn test_first_page_without_container_is_structural_change() {
    let fetcher = FakeFetcher::new().page(PAGE_1, "<html><body></body></html>".to_string());
    let walker = ListWalker::new(fetcher, options());

    let err = walker.walk(PAGE_1, &MemoryCacheStore::default()).await.unwrap_err();
    assert!(matches!(err, WalkError::StructuralChange { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_listing_fetch_failure_aborts() {
    let fetcher = FakeFetcher::new().rate_limited(PAGE_1);
    let walker = ListWalker::new(fetcher, options());

    let err = walker.walk(PAGE_1, &MemoryCacheStore::default()).await.unwrap_err();
    assert!(matches!(err, WalkError::Fetch(FetchError::RateLimited { .. })));
    assert_eq!(walker.fetcher.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cache_save_failure_on_success_is_reported() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/a/"], None))
        .page(&film_url("a"), film_page(Some(1)));
    let walker = ListWalker::new(fetcher, options());

    let err = walker.walk(PAGE_1, &MemoryCacheStore::failing()).await.unwrap_err();
    assert!(matches!(err, WalkError::Cache(_)));
}

#[tokio::test(start_paused = true)]
async fn test_cache_save_failure_on_abort_keeps_original_error() {
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, list_page(&["/film/a/"], Some("/someone/watchlist/page/2/")))
        .page(&film_url("a"), film_page(Some(1)));
    let walker = ListWalker::new(fetcher, options());

    let err = walker.walk(PAGE_1, &MemoryCacheStore::failing()).await.unwrap_err();
    assert!(matches!(err, WalkError::Fetch(FetchError::Status { status: 404, .. })));
}

#[tokio::test(start_paused = true)]
async fn test_entries_without_reference_are_counted() {
    let html = format!(
        r#"<html><body><ul class="poster-list"><li><div></div></li>{}</ul></body></html>"#,
        r#"<li><div data-target-link="/film/a/"></div></li>"#
    );
    let fetcher = FakeFetcher::new()
        .page(PAGE_1, html)
        .page(&film_url("a"), film_page(Some(1)));
    let walker = ListWalker::new(fetcher, options());

    let outcome = walker.walk(PAGE_1, &MemoryCacheStore::default()).await.unwrap();
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.ids, vec![id(1)]);
}
