use super::prompts;
use super::ui::{is_interactive, StepSpinner};
use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::time::Duration;
use watchlist_sync_config::{Config, CredentialStore, LetterboxdConfig, PathManager};
use watchlist_sync_sources::PlexHttpClient;

pub async fn run_config(cmd: crate::ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, output),
        crate::ConfigCommands::Plex { token, server_url } => configure_plex(token, server_url, output).await,
        crate::ConfigCommands::Letterboxd { username, list_url } => configure_letterboxd(username, list_url, output),
    }
}

/// Config file (or defaults) with `PLEX_HOST` applied
pub fn load_config() -> Result<Config> {
    let config_file = PathManager::default().config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    Ok(config.with_env_overrides())
}

pub fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'letterplex config letterboxd' and 'letterplex config plex' to create it. Defaults are shown below.");
    }

    let config = load_config()?;
    let cred_store = load_credentials(&path_manager)?;
    let token = cred_store.resolve_plex_token();
    let token_display = match &token {
        Some(t) if full => t.clone(),
        Some(t) => mask_string(t),
        None => "<not set>".to_string(),
    };
    let letterboxd = config.letterboxd.clone().unwrap_or_default();
    let list_url = letterboxd.list_url().unwrap_or_else(|| "<not set>".to_string());

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "data_dir": path_manager.data_dir().display().to_string(),
            "letterboxd": {
                "username": letterboxd.username,
                "list_url": list_url,
                "base_url": letterboxd.base_url,
            },
            "plex": {
                "server_url": config.plex.server_url,
                "library_section": config.plex.library_section,
                "playlist_name": config.plex.playlist_name,
                "token": token_display,
            },
            "scrape": {
                "item_delay_secs": config.scrape.item_delay_secs,
                "page_delay_secs": config.scrape.page_delay_secs,
                "rate_limit_pause_secs": config.scrape.rate_limit_pause_secs,
                "max_rate_limit_retries": config.scrape.max_rate_limit_retries,
                "request_timeout_secs": config.scrape.request_timeout_secs,
            },
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("\n{}", "Configuration".bright_cyan().bold());
    println!("{}\n", "─".repeat("Configuration".len()).bright_cyan());

    let section = |title: &str, rows: Vec<(&str, String)>| {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new(title).fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        ]);
        for (key, value) in rows {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}\n", table);
    };

    section("Files", vec![
        ("Config File", config_file.display().to_string()),
        ("Data Directory", path_manager.data_dir().display().to_string()),
    ]);
    section("Letterboxd", vec![
        ("Username", letterboxd.username.clone().unwrap_or_else(|| "<not set>".to_string())),
        ("List URL", list_url),
    ]);
    section("Plex", vec![
        ("Server URL", if config.plex.server_url.is_empty() { "<not set>".to_string() } else { config.plex.server_url.clone() }),
        ("Library Section", config.plex.library_section.clone()),
        ("Playlist", config.plex.playlist_name.clone()),
        ("Token", token_display),
    ]);
    section("Scrape Pacing", vec![
        ("Item Delay", format!("{}s", config.scrape.item_delay_secs)),
        ("Page Delay", format!("{}s", config.scrape.page_delay_secs)),
        ("Rate-Limit Pause", format!("{}s (max {} retries)", config.scrape.rate_limit_pause_secs, config.scrape.max_rate_limit_retries)),
    ]);

    Ok(())
}

async fn configure_plex(token_arg: Option<String>, server_url_arg: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager.ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let config_file = path_manager.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let mut cred_store = load_credentials(&path_manager)?;
    let interactive = is_interactive();

    let server_url = match server_url_arg {
        Some(url) => url.trim().to_string(),
        None if interactive => {
            let existing = (!config.plex.server_url.is_empty()).then_some(config.plex.server_url.as_str());
            prompts::prompt_string("Plex Server URL (e.g. http://127.0.0.1:32400)", existing)?
                .trim()
                .to_string()
        }
        None => config.plex.server_url.clone(),
    };

    let token = match token_arg {
        Some(token) => Some(token.trim().to_string()),
        None if interactive => {
            let has_token = cred_store.get_plex_token().is_some();
            let input = prompts::prompt_password("Plex API Token", !has_token)?;
            if input.trim().is_empty() && !has_token {
                return Err(color_eyre::eyre::eyre!("Plex token is required"));
            }
            (!input.trim().is_empty()).then(|| input.trim().to_string())
        }
        None => None,
    };

    config.plex.server_url = server_url;
    config.validate_sync()
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    if let Some(token) = token.as_ref().or(cred_store.get_plex_token()) {
        let spinner = StepSpinner::start("Verifying Plex server and token...", output.is_quiet());
        let verified = match PlexHttpClient::new(token.clone(), &config.plex.server_url, Duration::from_secs(10)) {
            Ok(client) => client.get_machine_identifier().await,
            Err(e) => Err(e),
        };
        spinner.finish();
        match verified {
            Ok(machine_id) => output.success(format!("Connected to Plex server {}", machine_id)),
            Err(e) => {
                output.warn(format!("Could not verify Plex server: {:#}", e));
                if interactive && !prompts::prompt_yes_no("Save anyway?", Some(false))? {
                    return Err(color_eyre::eyre::eyre!("Plex verification failed"));
                }
            }
        }
    }

    config.save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    if let Some(token) = token {
        cred_store.set_plex_token(token);
        cred_store.save()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))?;
    }

    output.success("Plex configuration saved!");
    output.info(format!("  Server URL: {}", config.plex.server_url));
    Ok(())
}

fn configure_letterboxd(username: Option<String>, list_url: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager.ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let config_file = path_manager.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let mut letterboxd = config.letterboxd.take().unwrap_or_default();

    if username.is_none() && list_url.is_none() && is_interactive() {
        let input = prompts::prompt_string("Letterboxd username", letterboxd.username.as_deref())?;
        letterboxd.username = non_empty(input);
        let input = prompts::prompt_string("List URL (optional, press Enter to use the watchlist)", letterboxd.list_url.as_deref())?;
        letterboxd.list_url = non_empty(input);
    } else {
        if let Some(username) = username {
            letterboxd.username = non_empty(username);
        }
        if let Some(list_url) = list_url {
            letterboxd.list_url = non_empty(list_url);
        }
    }

    config.letterboxd = Some(letterboxd);
    config.validate_scrape()
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    config.save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    let list = config.letterboxd.as_ref().and_then(LetterboxdConfig::list_url).unwrap_or_default();
    output.success("Letterboxd configuration saved!");
    output.info(format!("  List: {}", list));
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}
