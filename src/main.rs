//! Station-Harvest main entry point
//!
//! This is the command-line interface for the Station-Harvest pipeline.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use station_harvest::config::{load_config_with_hash, resolve_api_key, Config};
use station_harvest::harvest::harvest;
use station_harvest::output::print_statistics;
use tracing_subscriber::EnvFilter;

/// Harvest completed, possibly with skipped units
const EXIT_OK: u8 = 0;

/// Regions could not be discovered
const EXIT_DISCOVERY_FAILED: u8 = 1;

/// Bad configuration, missing API key or unwritable output
const EXIT_SETUP_FAILED: u8 = 2;

/// Station-Harvest: a polite two-level listing harvester
///
/// Walks the region and sub-region selectors of a listing site, scrapes the
/// station table of each selected sub-region, geocodes every address and
/// writes the result to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "station-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite two-level listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Geocoding API key (overrides the config file)
    #[arg(long, env = "GEOCODING_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write the CSV here instead of the configured path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Validate config and show what would be harvested without any requests
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.csv_path));

    if cli.dry_run {
        handle_dry_run(&config, &output);
        return ExitCode::from(EXIT_OK);
    }

    let api_key = match resolve_api_key(&config, cli.api_key.as_deref()) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(EXIT_SETUP_FAILED);
        }
    };

    handle_harvest(&config, &api_key, &output, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("station_harvest=info,warn"),
            1 => EnvFilter::new("station_harvest=debug,info"),
            2 => EnvFilter::new("station_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, output: &Path) {
    println!("=== Station-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Listing URL: {}", config.site.listing_url);
    println!("  Region control: #{}", config.site.region_control);
    println!("  Sub-region control: #{}", config.site.sub_region_control);
    println!("  Station table class: {}", config.site.table_class);

    println!("\nFetching:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Retry delay: {}ms", config.fetch.retry_delay_ms);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Client identities: {}", config.fetch.user_agents.len());

    println!("\nTraversal:");
    println!("  Regions: {}", config.traversal.max_regions);
    println!(
        "  Sub-regions per region: {}",
        config.traversal.max_sub_regions_per_region
    );
    println!("  Delay between sub-regions: {}ms", config.traversal.area_delay_ms);

    println!("\nGeocoding:");
    println!("  Endpoint: {}", config.geocoding.endpoint);
    println!(
        "  API key in config: {}",
        if config.geocoding.api_key.is_some() { "yes" } else { "no" }
    );

    println!("\nOutput:");
    println!("  CSV: {}", output.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation and maps the outcome to an exit code
async fn handle_harvest(config: &Config, api_key: &str, output: &Path, quiet: bool) -> ExitCode {
    match harvest(config, api_key, output).await {
        Ok(stats) => {
            if !quiet {
                print_statistics(&stats);
            }
            ExitCode::from(EXIT_OK)
        }
        Err(e) if e.is_fatal_discovery() => {
            tracing::error!("Harvest failed: {}", e);
            ExitCode::from(EXIT_DISCOVERY_FAILED)
        }
        Err(e) => {
            tracing::error!("Harvest aborted: {}", e);
            ExitCode::from(EXIT_SETUP_FAILED)
        }
    }
}
