use super::config::{load_config, load_credentials};
use super::ui::StepSpinner;
use crate::output::Output;
use color_eyre::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::PathBuf;
use watchlist_sync_config::PathManager;
use watchlist_sync_core::{CacheManager, LibrarySync, ReconcileOutcome};
use watchlist_sync_sources::{PlexHttpClient, PlexLibrary};

pub async fn run_sync(entries: Option<PathBuf>, report: Option<PathBuf>, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let config = load_config()?;
    config.validate_sync()
        .map_err(|e| color_eyre::eyre::eyre!("Configuration validation failed: {}", e))?;

    let path_manager = PathManager::default();
    let cred_store = load_credentials(&path_manager)?;
    let token = cred_store.resolve_plex_token()
        .ok_or_else(|| color_eyre::eyre::eyre!("Plex token not found. Run 'letterplex config plex' or set PLEX_TOKEN"))?;

    let cache = CacheManager::new(&path_manager)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to open cache: {}", e))?;
    let entries = cache.load_entries(entries.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    let spinner = StepSpinner::start("Connecting to Plex...", output.is_quiet());
    let api = PlexHttpClient::new(token, &config.plex.server_url, config.scrape.request_timeout())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create Plex client: {}", e))?;
    let library = PlexLibrary::connect(api, &config.plex.library_section).await
        .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    spinner.set_message(format!("Matching {} entries and updating '{}'...", entries.len(), config.plex.playlist_name));
    let mut rng = StdRng::from_entropy();
    let synced = LibrarySync::new(&library, &library, &cache, config.plex.playlist_name.clone())
        .with_report_path(report)
        .run(&entries, &mut rng)
        .await;
    spinner.finish();
    let result = synced.map_err(|e| color_eyre::eyre::eyre!("Sync failed: {:#}", e))?;

    if !output.is_human() {
        output.json(&json!({
            "status": "success",
            "playlist": config.plex.playlist_name,
            "matched": result.matched(),
            "total": result.results.len(),
            "outcome": result.outcome,
            "report": result.report_path.display().to_string(),
            "results": result.results,
        }));
        return Ok(());
    }

    output.table(
        vec!["Film", "TMDB", "Availability"],
        result
            .results
            .iter()
            .map(|r| {
                vec![
                    r.film_name.clone(),
                    r.tmdb_id.as_ref().map(ToString::to_string).unwrap_or_default(),
                    r.availability.to_string(),
                ]
            })
            .collect(),
    );
    output.success(format!(
        "{} of {} films available; playlist '{}' {}",
        result.matched(),
        result.results.len(),
        config.plex.playlist_name,
        describe_outcome(&result.outcome)
    ));
    output.info(format!("Match report: {}", result.report_path.display()));
    Ok(())
}

fn describe_outcome(outcome: &ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::Unchanged => "left absent".to_string(),
        ReconcileOutcome::Deleted => "deleted".to_string(),
        ReconcileOutcome::Created { items } => format!("created with {} items", items),
        ReconcileOutcome::Updated { kept_anchor, removed, added } => format!(
            "updated (+{} / -{}{})",
            added,
            removed,
            if *kept_anchor { ", anchor kept" } else { "" }
        ),
        ReconcileOutcome::Recreated { items, cause } => {
            format!("recreated with {} items after in-place update failed ({})", items, cause)
        }
    }
}
