use super::config::load_config;
use super::ui::StepSpinner;
use crate::output::Output;
use color_eyre::Result;
use serde_json::json;
use watchlist_sync_config::PathManager;
use watchlist_sync_core::{CacheManager, ListWalker, WalkerOptions};
use watchlist_sync_sources::LetterboxdHttpClient;

pub async fn run_scrape(url: Option<String>, output: &Output) -> Result<()> {
    tracing::debug!("Scrape command started");

    let config = load_config()?;
    let letterboxd = config.letterboxd.clone().unwrap_or_default();
    let start_url = match url {
        Some(url) => url,
        None => {
            config.validate_scrape()
                .map_err(|e| color_eyre::eyre::eyre!("Configuration validation failed: {}", e))?;
            letterboxd.list_url()
                .ok_or_else(|| color_eyre::eyre::eyre!("No Letterboxd list configured"))?
        }
    };

    let path_manager = PathManager::default();
    let cache = CacheManager::new(&path_manager)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to open cache: {}", e))?;

    let client = LetterboxdHttpClient::new(config.scrape.request_timeout())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;
    let walker = ListWalker::new(client, WalkerOptions::new(letterboxd.base_url.clone(), &config.scrape));

    let spinner = StepSpinner::start(format!("Walking {}...", start_url), output.is_quiet());
    let walked = walker.walk(&start_url, &cache.resolution_store()).await;
    spinner.finish();
    let outcome = walked.map_err(|e| color_eyre::eyre::eyre!("Scrape failed: {}", e))?;

    cache.save_watchlist_ids(&outcome.ids)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save watchlist ids: {}", e))?;

    if !output.is_human() {
        output.json(&json!({
            "status": "success",
            "list_url": start_url,
            "outcome": outcome,
        }));
        return Ok(());
    }

    output.success(format!("Resolved {} films from {}", outcome.ids.len(), start_url));
    output.table(
        vec!["Pages", "Cached", "Fetched", "Resolved", "No TMDB link", "Failed", "Skipped", "Rate-limit pauses"],
        vec![vec![
            outcome.pages_fetched.to_string(),
            outcome.cache_hits.to_string(),
            outcome.detail_fetches.to_string(),
            outcome.newly_resolved.to_string(),
            outcome.unresolved.to_string(),
            outcome.failed.to_string(),
            outcome.skipped.to_string(),
            outcome.rate_limit_pauses.to_string(),
        ]],
    );
    if outcome.failed > 0 {
        output.warn(format!("{} films could not be fetched; they will be retried on the next run", outcome.failed));
    }
    Ok(())
}
