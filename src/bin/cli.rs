//! mapthens CLI
//!
//! Local execution entry point. For scheduled batch runs, use `mapthens-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mapthens::{
    error::{AppError, Result},
    models::Config,
    pipeline, server,
    services::{Geocoder, MapboxGeocoder},
    storage::{EventStore, LocalCache},
    utils::http,
};

/// mapthens - today's local events on a map
#[derive(Parser, Debug)]
#[command(name = "mapthens", version, about = "Scrape, geocode and serve today's events")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "mapthens.toml")]
    config: PathBuf,

    /// Override the cache file location
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the events endpoint
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scrape today's listing now and overwrite the cache
    Scrape,

    /// Geocode a single address
    Geocode {
        /// Free-text postal address
        address: String,
    },

    /// Validate configuration
    Validate,

    /// Show cache file status
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = if cli.config.exists() {
        Config::load_or_default(&cli.config)
    } else {
        log::debug!("No config file at {}, using defaults", cli.config.display());
        Config::default()
    };
    config.apply_env();
    if let Some(path) = cli.cache {
        config.cache.path = path;
    }

    let cache = Arc::new(LocalCache::new(&config.cache.path));

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let provider = Arc::new(pipeline::build_provider(&config, cache)?);
            server::serve(&config, provider).await?;
        }

        Command::Scrape => {
            let summary = pipeline::run_scrape(&config, cache).await?;
            log::info!(
                "Scrape complete: {} events, {} unmapped, saved to {}",
                summary.event_count,
                summary.unmapped_count,
                summary.location
            );
        }

        Command::Geocode { address } => {
            config.validate()?;
            let client = http::create_async_client(&config.http)?;
            let geocoder = MapboxGeocoder::new(client, &config.geocoder);
            let coords = geocoder.resolve(&address).await?;
            println!("{}, {}", coords.longitude, coords.latitude);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Cache file: {}", cache.location());
            match cache.load().await {
                Ok(events) => {
                    let unmapped = events.iter().filter(|e| !e.is_mapped()).count();
                    log::info!("Cached events: {} ({} unmapped)", events.len(), unmapped);
                    if let Some(first) = events.first() {
                        log::info!("Cached for: {}", first.date);
                    }
                }
                Err(AppError::NotFound(_)) => log::info!("No cache yet."),
                Err(e) => {
                    log::error!("Cache unreadable: {}", e);
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
