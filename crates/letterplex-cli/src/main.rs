use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, scrape, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "letterplex")]
#[command(about = "Letterplex - Mirror a Letterboxd watchlist into a Plex playlist")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a Letterboxd list and resolve every film to a TMDB id
    #[command(long_about = "Walk every page of a Letterboxd watchlist or list, resolving each film to its TMDB id. Resolutions are cached, so later runs only fetch films added since. The ordered ids are written to watchlist_ids.json in the data directory.")]
    Scrape {
        /// List to walk instead of the configured one
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },
    /// Match watchlist entries against Plex and update the playlist
    #[command(long_about = "Look up every watchlist entry in the configured Plex movie section, write a match report, and make the playlist contain exactly the movies that were found.")]
    Sync {
        /// Entries file to read (defaults to tmdb_watchlist_cache.json in the data directory)
        #[arg(long, value_name = "PATH")]
        entries: Option<PathBuf>,

        /// Where to write the match report (defaults to plex_watchlist_cache.json in the data directory)
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },
    /// Configure credentials and settings
    #[command(long_about = "Manage configuration and credentials for Letterplex. Use subcommands to view or modify settings for Plex and Letterboxd. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear cached data
    #[command(long_about = "Clear cached data or stored credentials. Use --cache to drop the film resolution cache, --credentials to remove the stored Plex token, or --all for both.")]
    Clear {
        /// Clear cache and credentials
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["cache", "credentials"])]
        all: bool,

        /// Clear the film resolution cache
        #[arg(long, action = ArgAction::SetTrue)]
        cache: bool,

        /// Clear stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show the Plex token unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the Plex server and token
    #[command(long_about = "Configure the Plex server URL and API token. The token can be found by inspecting network requests in Plex Web (look for the X-Plex-Token header). PLEX_HOST and PLEX_TOKEN override these at runtime.")]
    Plex {
        /// Plex API Token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Plex Server URL, e.g. http://127.0.0.1:32400 (if not provided, will prompt)
        #[arg(long)]
        server_url: Option<String>,
    },

    /// Configure which Letterboxd list to scrape
    Letterboxd {
        /// Letterboxd username; their watchlist is scraped
        #[arg(long)]
        username: Option<String>,

        /// Full URL of a list, used instead of the watchlist
        #[arg(long)]
        list_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Logging is set up before commands run, so a broken config file only loses the log file setting
    let log_file = config::load_config().ok().and_then(|c| c.logging.file);
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Scrape { url } => scrape::run_scrape(url, &output).await,
        Commands::Sync { entries, report } => sync::run_sync(entries, report, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
        Commands::Clear { all, cache, credentials } => clear::run_clear(all, cache, credentials, &output).await,
    };

    if let Err(e) = &result {
        output.error(format!("{:#}", e));
    }
    result
}
