use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, trace};
use watchlist_sync_models::{CanonicalId, ItemReference};

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).expect("valid CSS selector"));
    };
}

// The poster list is the structural marker of a listing page. Missing means
// the layout changed, not that the list is empty.
selector!(POSTER_LIST_SELECTOR, "ul.poster-list");
selector!(LIST_ITEM_SELECTOR, "li");
selector!(DIV_SELECTOR, "div");
selector!(NEXT_PAGE_SELECTOR, "a.next");
selector!(ANCHOR_SELECTOR, "a[href]");

static TMDB_MOVIE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?themoviedb\.org/movie/([0-9]+)(?:[/?#]|$)").expect("valid regex")
});

const ITEM_LINK_ATTR: &str = "data-target-link";

/// What a listing page yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// References in document order; entries without one are dropped
    pub items: Vec<ItemReference>,
    /// Raw `href` of the "next page" anchor
    pub next_href: Option<String>,
    /// Number of list entries that carried no reference
    pub skipped: usize,
}

/// Parse a listing page, or `None` when the poster list is missing
pub fn parse_list_page(html: &str) -> Option<ListPage> {
    let document = Html::parse_document(html);
    let container = document.select(&POSTER_LIST_SELECTOR).next()?;

    let mut items = Vec::new();
    let mut skipped = 0;
    for entry in container.select(&LIST_ITEM_SELECTOR) {
        let reference = entry
            .select(&DIV_SELECTOR)
            .next()
            .and_then(|div| div.value().attr(ITEM_LINK_ATTR))
            .map(str::trim)
            .filter(|link| !link.is_empty());

        match reference {
            Some(link) => items.push(ItemReference::new(link)),
            None => {
                trace!("Letterboxd: list entry without {}", ITEM_LINK_ATTR);
                skipped += 1;
            }
        }
    }

    let next_href = document
        .select(&NEXT_PAGE_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    debug!(
        "Letterboxd: parsed list page with {} items ({} skipped), next page: {}",
        items.len(),
        skipped,
        next_href.is_some()
    );
    Some(ListPage { items, next_href, skipped })
}

/// First TMDB movie id linked from a film page
pub fn parse_detail_page(html: &str) -> Option<CanonicalId> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| {
            TMDB_MOVIE_REGEX
                .captures(href.trim())
                .and_then(|captures| captures.get(1))
                .and_then(|id| CanonicalId::new(id.as_str()).ok())
        })
}
