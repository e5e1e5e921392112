use crate::output::Output;
use color_eyre::Result;
use std::fs;
use watchlist_sync_config::PathManager;
use watchlist_sync_core::CacheManager;

pub async fn run_clear(all: bool, cache: bool, credentials: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if all {
        clear_cache(&path_manager, output)?;
        clear_credentials(&path_manager, output)?;
        output.success("Cache and credentials cleared");
        return Ok(());
    }

    if cache {
        clear_cache(&path_manager, output)?;
    }
    if credentials {
        clear_credentials(&path_manager, output)?;
    }

    if !cache && !credentials {
        output.warn("No clear option specified. Use --cache, --credentials, or --all");
        output.info("\nExample: letterplex clear --cache");
    }

    Ok(())
}

fn clear_cache(path_manager: &PathManager, output: &Output) -> Result<()> {
    if !path_manager.cache_dir().exists() {
        output.info("No cache found to clear");
        return Ok(());
    }
    let cache_manager = CacheManager::new(path_manager)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to open cache: {}", e))?;
    cache_manager.clear_cache()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to clear cache: {}", e))?;
    output.success(format!("Cleared film cache: {}", path_manager.cache_dir().display()));
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();

    if credentials_file.exists() {
        fs::remove_file(&credentials_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to remove credentials file at {}: {}", credentials_file.display(), e))?;
        output.success(format!("Cleared credentials: {}", credentials_file.display()));
    } else {
        output.info("No credentials file found to clear");
    }

    Ok(())
}
